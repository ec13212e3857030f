use serde::{Deserialize, Serialize};
use servicehub_models::{PostcodeParts, Profile, UserType};
use validator::Validate;

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// `/auth/login` and `/auth/register` reply.
#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    pub token: String,
    pub user: Profile,
}

/// `/auth/profile` reply.
#[derive(Debug, Deserialize)]
pub(crate) struct ProfileResponse {
    pub user: Profile,
}

/// Everything the sign-up form collects.
#[derive(Debug, Clone, Validate)]
pub struct SignUpForm {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    pub user_type: UserType,
    pub phone: Option<String>,
    /// UK postcode as typed, e.g. `SW13 9WT`.
    pub postcode: String,
    pub address: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub user_type: UserType,
    pub phone: Option<&'a str>,
    pub postcode: &'a str,
    pub postcode_p1: String,
    pub postcode_p2: String,
    pub postcode_p3: String,
    pub address: Option<&'a str>,
    pub city: Option<&'a str>,
}

impl<'a> RegisterRequest<'a> {
    pub fn from_form(form: &'a SignUpForm) -> Self {
        let PostcodeParts { p1, p2, p3 } = PostcodeParts::split(&form.postcode);
        Self {
            email: &form.email,
            password: &form.password,
            first_name: &form.first_name,
            last_name: &form.last_name,
            user_type: form.user_type,
            phone: form.phone.as_deref(),
            postcode: &form.postcode,
            postcode_p1: p1,
            postcode_p2: p2,
            postcode_p3: p3,
            address: form.address.as_deref(),
            city: form.city.as_deref(),
        }
    }
}
