//! Input validation for the sign-up and login forms

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

use crate::models::{LoginRequest, SignUpRequest};

/// Gender values accepted by the backend, with their display labels
pub const GENDER_OPTIONS: [(&str, &str); 5] = [
    ("male", "Male"),
    ("female", "Female"),
    ("non_binary", "Non-binary"),
    ("prefer_not_to_say", "Prefer not to say"),
    ("custom", "Custom"),
];

const MIN_AGE: i32 = 13;
const MAX_AGE: i32 = 120;

/// Validate a first or last name
pub fn validate_name(label: &str, name: &str) -> Result<(), String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(format!("{} is required", label));
    }

    if name.chars().count() < 2 {
        return Err(format!("{} must be at least 2 characters", label));
    }

    if !name
        .chars()
        .all(|c| c.is_alphabetic() || c.is_whitespace() || c == '-' || c == '\'')
    {
        return Err(format!("{} can only contain letters", label));
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    let email = email.trim();

    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._-]+@[a-z]+\.+[a-z]+$").expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Please enter a valid email address".to_string());
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    let length = password.chars().count();
    if length < 8 {
        return Err("Password must be at least 8 characters".to_string());
    }

    if !password.chars().any(char::is_uppercase) {
        return Err("Password must contain at least one uppercase letter".to_string());
    }

    if !password.chars().any(char::is_lowercase) {
        return Err("Password must contain at least one lowercase letter".to_string());
    }

    if !password.chars().any(char::is_numeric) {
        return Err("Password must contain at least one number".to_string());
    }

    Ok(())
}

/// Validate birthday; age is the difference in calendar years
pub fn validate_birthday(birthday: NaiveDate, today: NaiveDate) -> Result<(), String> {
    let age = today.year() - birthday.year();

    if age < MIN_AGE {
        return Err(format!(
            "You must be at least {} years old to sign up",
            MIN_AGE
        ));
    }

    if age > MAX_AGE {
        return Err("Please enter a valid birthday".to_string());
    }

    Ok(())
}

/// Every field error of a rejected sign-up form
#[derive(Error, Debug, Default, Clone, PartialEq)]
#[error("sign up form is invalid")]
pub struct SignUpErrors {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub birthday: Option<String>,
    pub gender: Option<String>,
}

impl SignUpErrors {
    fn is_empty(&self) -> bool {
        *self == SignUpErrors::default()
    }

    /// First error message, in form order
    pub fn first(&self) -> Option<&str> {
        [
            &self.first_name,
            &self.last_name,
            &self.email,
            &self.password,
            &self.birthday,
            &self.gender,
        ]
        .into_iter()
        .find_map(|e| e.as_deref())
    }
}

/// Sign-up form as typed by the user
#[derive(Clone)]
pub struct SignUpForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub birthday: NaiveDate,
    pub gender: String,
}

impl SignUpForm {
    /// Check every field, collecting all failures
    pub fn validate(&self, today: NaiveDate) -> Result<(), SignUpErrors> {
        let errors = SignUpErrors {
            first_name: validate_name("First name", &self.first_name).err(),
            last_name: validate_name("Last name", &self.last_name).err(),
            email: validate_email(&self.email).err(),
            password: validate_password(&self.password).err(),
            birthday: validate_birthday(self.birthday, today).err(),
            gender: (!GENDER_OPTIONS.iter().any(|(value, _)| *value == self.gender))
                .then(|| "Please select a gender option".to_string()),
        };

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Normalised request body: trimmed names, lower-cased email
    pub fn to_request(&self) -> SignUpRequest {
        SignUpRequest {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            password: self.password.clone(),
            birthday: self.birthday.format("%Y-%m-%d").to_string(),
            gender: self.gender.clone(),
        }
    }
}

/// Login form as typed by the user
#[derive(Clone)]
pub struct LoginForm {
    pub email_or_username: String,
    pub password: String,
}

impl LoginForm {
    /// First problem with the form, if any
    pub fn validate(&self) -> Result<(), String> {
        if self.email_or_username.trim().is_empty() {
            return Err("Please enter your email or username".to_string());
        }

        if self.password.is_empty() {
            return Err("Please enter your password".to_string());
        }

        Ok(())
    }

    pub fn to_request(&self) -> LoginRequest {
        LoginRequest {
            email_or_username: self.email_or_username.trim().to_string(),
            password: self.password.clone(),
        }
    }
}
