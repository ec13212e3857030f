use serde::{Deserialize, Serialize};

/// A UK postcode split into the three fixed-width parts the register
/// endpoint expects.
///
/// `p1` is the outward code without its last character, `p2` that last
/// character and `p3` the inward code. Input that is not exactly two
/// single-space separated tokens splits into three empty parts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostcodeParts {
    pub p1: String,
    pub p2: String,
    pub p3: String,
}

impl PostcodeParts {
    pub fn split(postcode: &str) -> Self {
        let tokens: Vec<&str> = postcode.split(' ').collect();
        let [outward, inward] = tokens.as_slice() else {
            return Self::default();
        };
        if outward.is_empty() || inward.is_empty() {
            return Self::default();
        }

        let mut chars = outward.chars();
        let Some(last) = chars.next_back() else {
            return Self::default();
        };

        Self {
            p1: chars.as_str().to_string(),
            p2: last.to_string(),
            p3: (*inward).to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.p1.is_empty() && self.p2.is_empty() && self.p3.is_empty()
    }
}
