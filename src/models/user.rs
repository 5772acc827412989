// src/models/user.rs

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::enums::{Gender, UserRole};

static PHONE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9][0-9 \-]{5,18}[0-9]$").expect("valid phone regex"));

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,

    /// Display name.
    pub name: String,

    /// Unique login name.
    pub username: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub email: String,

    #[sqlx(try_from = "String")]
    pub role: UserRole,

    pub full_name: String,

    #[sqlx(try_from = "Option<String>")]
    pub gender: OptionalGender,

    pub birth_year: Option<i32>,

    pub phone_number: Option<String>,

    pub email_verified: bool,

    #[serde(skip)]
    pub email_verification_token: Option<String>,

    #[serde(skip)]
    pub email_verification_token_expiry: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

/// Nullable gender column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OptionalGender(pub Option<Gender>);

impl TryFrom<Option<String>> for OptionalGender {
    type Error = crate::models::enums::UnknownVariant;

    fn try_from(value: Option<String>) -> Result<Self, Self::Error> {
        value
            .map(Gender::try_from)
            .transpose()
            .map(OptionalGender)
    }
}

/// DTO for registering a student or a teacher.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    #[validate(length(min = 1, max = 100, message = "Name must not be empty."))]
    pub name: String,

    #[validate(email(message = "Email is not valid."))]
    pub email: String,

    #[validate(length(
        min = 3,
        max = 50,
        message = "Username length must be between 3 and 50 characters."
    ))]
    pub username: String,

    #[validate(length(
        min = 6,
        max = 128,
        message = "Password length must be between 6 and 128 characters."
    ))]
    pub password: String,

    #[validate(length(min = 1, max = 200, message = "Full name must not be empty."))]
    pub full_name: String,

    pub gender: Option<Gender>,

    #[validate(range(min = 1900, max = 2100, message = "Birth year is out of range."))]
    pub birth_year: Option<i32>,

    #[validate(regex(path = *PHONE_NUMBER, message = "Phone number is not valid."))]
    pub phone_number: Option<String>,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Returned after a successful login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub name: String,
    pub email: String,
    pub full_name: String,
    pub gender: Option<Gender>,
    pub birth_year: Option<i32>,
    pub phone_number: Option<String>,
    pub user_role: UserRole,
    pub email_verified: bool,
}

#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailParams {
    pub token: String,
}
