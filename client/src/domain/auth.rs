//! Login and signup form primitives.
//!
//! Forms are validated before any request is sent. Failures come back as
//! [`FieldErrors`] keyed by the form's wire field names so each message can be
//! shown next to its input.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Value, json};
use zeroize::Zeroizing;

use crate::domain::FieldErrors;

/// Message shown when a sign-in attempt is rejected for any reason other than
/// connectivity.
pub const INVALID_LOGIN_MESSAGE: &str = "Invalid email or password.";
/// Backend message for a unique-constraint violation.
pub const DUPLICATE_RECORD_MESSAGE: &str =
    "A record with these values already exists. Please use different values.";
/// Message shown when signing up with an email that is already registered.
pub const USERNAME_EXISTS_MESSAGE: &str = "Username already exists please login to contine.";
/// Message shown for every other signup failure.
pub const REGISTRATION_FAILED_MESSAGE: &str = "Registration failed. Please try again.";
/// Profile picture remembered for every new session.
pub const DEFAULT_PROFILE_PICTURE: &str = "https://images.pexels.com/photos/1081685/pexels-photo-1081685.jpeg?auto=compress&cs=tinysrgb&dpr=1&w=500";
/// Minimum password length accepted at signup.
pub const PASSWORD_MIN: usize = 6;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"\S+@\S+\.\S+")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    if email.trim().is_empty() {
        errors.insert("email", "Email is required.");
    } else if !email_regex().is_match(email) {
        errors.insert("email", "Please enter a valid email address.");
    }
}

/// Validated sign-in credentials.
///
/// # Examples
/// ```
/// use ledger_client::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("ada@example.com", "hunter2").unwrap();
/// assert_eq!(creds.email(), "ada@example.com");
///
/// let errors = LoginCredentials::try_from_parts("ada", "").unwrap_err();
/// assert_eq!(errors.get("email"), Some("Please enter a valid email address."));
/// assert_eq!(errors.get("password"), Some("Password is required."));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Validate raw form input. The email is trimmed; the password is kept
    /// exactly as typed.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        check_email(&mut errors, email);
        if password.trim().is_empty() {
            errors.insert("password", "Password is required.");
        }
        errors.check()?;
        Ok(Self {
            email: email.trim().to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email address.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password as typed.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Body of the sign-in request.
    pub fn to_payload(&self) -> Value {
        json!({"email": self.email, "password": self.password.as_str()})
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Signup form contents.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Registration {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Email address used to sign in.
    pub email: String,
    /// Country of residence.
    pub location: String,
    /// Contact phone number.
    pub phone_number: String,
    /// Chosen password.
    pub password: Zeroizing<String>,
    /// Password confirmation.
    pub re_password: Zeroizing<String>,
    /// Whether the terms and conditions were accepted.
    pub terms_accepted: bool,
}

impl Registration {
    /// Check every field, collecting one message per failing field.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.first_name.trim().is_empty() {
            errors.insert("firstName", "First name is required.");
        }
        if self.last_name.trim().is_empty() {
            errors.insert("lastName", "Last name is required.");
        }
        check_email(&mut errors, &self.email);
        if self.location.is_empty() {
            errors.insert("location", "Country is required.");
        }
        if self.phone_number.trim().is_empty() {
            errors.insert("phoneNumber", "Phone number is required.");
        }
        if self.password.trim().is_empty() {
            errors.insert("password", "Password is required.");
        } else if self.password.chars().count() < PASSWORD_MIN {
            errors.insert("password", "Password must be at least 6 characters.");
        }
        if self.re_password.trim().is_empty() {
            errors.insert("rePassword", "Please confirm your password.");
        } else if self.password != self.re_password {
            errors.insert("rePassword", "Passwords do not match.");
        }
        if !self.terms_accepted {
            errors.insert("terms", "You must accept the terms and conditions.");
        }
        errors.check()
    }

    /// Body of the signup request. The confirmation, country and terms flag
    /// stay on the client.
    pub fn to_payload(&self) -> Value {
        json!({
            "firstName": self.first_name,
            "lastName": self.last_name,
            "email": self.email,
            "phoneNumber": self.phone_number,
            "password": self.password.as_str(),
        })
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("location", &self.location)
            .field("phone_number", &self.phone_number)
            .field("terms_accepted", &self.terms_accepted)
            .finish_non_exhaustive()
    }
}
