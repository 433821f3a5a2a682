//! Field rules shared by entity schemas.
//!
//! Each rule pairs a compiled pattern with the message reported when a value
//! does not match it.

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// A named pattern a string field must satisfy.
#[derive(Debug)]
pub struct FieldRule {
    pattern: &'static Lazy<Regex>,
    message: &'static str,
}

impl FieldRule {
    /// Compiled pattern backing this rule
    pub fn pattern(&self) -> &Regex {
        self.pattern
    }

    /// Message reported on mismatch
    pub fn message(&self) -> &'static str {
        self.message
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("field rule patterns are valid")
}

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| compile(r"^[a-zA-Z0-9]{6,10}$"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| compile(r"\S+@\S+\.\S+"));
static IMAGE_URL_RE: Lazy<Regex> =
    Lazy::new(|| compile(r"^(https?://)?([0-9a-z.-]+)\.([a-z.]{2,6})([/0-9A-Za-z_ .-]*)*/?$"));
static GROUP_NAME_RE: Lazy<Regex> = Lazy::new(|| compile(r"^[a-zA-Z0-9\s]{1,20}$"));
static GROUP_DESCRIPTION_RE: Lazy<Regex> = Lazy::new(|| compile(r"^[a-zA-Z0-9\s]{1,200}$"));
static CONTACT_NAME_RE: Lazy<Regex> = Lazy::new(|| compile(r"^[a-zA-Z0-9\s]{1,30}$"));
static PHONE_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| compile(r"^(\+?[0-9]{1,4})?(\(?[0-9]{1,4}\)?[\s-]?)?[0-9\s-]{3,10}(\*?[0-9]+)?$"));

/// Usernames: 6-10 letters or digits
pub static USERNAME: FieldRule = FieldRule {
    pattern: &USERNAME_RE,
    message: "Username must be 6-10 characters long and contain only letters and numbers.",
};

/// Email addresses (users and contacts)
pub static EMAIL: FieldRule = FieldRule {
    pattern: &EMAIL_RE,
    message: "Email is not valid!",
};

/// Profile and contact images
pub static IMAGE_URL: FieldRule = FieldRule {
    pattern: &IMAGE_URL_RE,
    message: "Image must be a valid URL.",
};

/// Group names
pub static GROUP_NAME: FieldRule = FieldRule {
    pattern: &GROUP_NAME_RE,
    message: "Name must be 1-20 characters long and contain only letters, numbers, and spaces.",
};

/// Group descriptions
pub static GROUP_DESCRIPTION: FieldRule = FieldRule {
    pattern: &GROUP_DESCRIPTION_RE,
    message: "Description must be 1-200 characters long and contain only letters, numbers, and spaces.",
};

/// Contact names
pub static CONTACT_NAME: FieldRule = FieldRule {
    pattern: &CONTACT_NAME_RE,
    message: "Name must be 1-30 characters long and contain only letters, numbers, and spaces.",
};

/// Individual phone numbers of a contact
pub static PHONE_NUMBER: FieldRule = FieldRule {
    pattern: &PHONE_NUMBER_RE,
    message: "Each number must be a valid phone number and there must be at least one number.",
};

/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates.
pub fn is_valid_date(value: &str) -> bool {
    DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}
