pub mod models;
pub mod postcode;

pub use models::*;
pub use postcode::PostcodeParts;
