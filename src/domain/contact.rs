//! Contact details captured when a visit is booked
//!
//! Contact persistence is write-once and best-effort. Phone numbers are
//! normalised to the Chilean mobile format `+56 9 XXXX XXXX` when recognisable.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Name, phone and optional email/RUT for a visit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rut: Option<String>,
}

impl ContactInfo {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            email: None,
            rut: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_rut(mut self, rut: impl Into<String>) -> Self {
        self.rut = Some(rut.into());
        self
    }

    /// Only contacts with both a name and a phone are stored
    pub fn is_persistable(&self) -> bool {
        !self.name.trim().is_empty() && !self.phone.trim().is_empty()
    }

    /// Returns a copy with trimmed fields, a normalised phone and blank optionals dropped
    pub fn normalized(&self) -> Self {
        let blank_to_none = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Self {
            name: self.name.trim().to_string(),
            phone: normalize_chilean_phone(self.phone.trim()),
            email: blank_to_none(&self.email),
            rut: blank_to_none(&self.rut),
        }
    }
}

fn phone_separators() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s\-().]").expect("static regex"))
}

fn strip_separators(phone: &str) -> String {
    phone_separators().replace_all(phone, "").into_owned()
}

/// True for Chilean mobile numbers: `9XXXXXXXX`, `569XXXXXXXX` or `+569XXXXXXXX`
pub fn is_valid_chilean_phone(phone: &str) -> bool {
    let cleaned = strip_separators(phone.trim());
    let digits = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    match digits.len() {
        9 => digits.starts_with('9') && !cleaned.starts_with('+'),
        11 => digits.starts_with("569"),
        _ => false,
    }
}

/// Normalises a Chilean mobile number to `+56 9 XXXX XXXX`
///
/// Unrecognised input is returned unchanged.
pub fn normalize_chilean_phone(phone: &str) -> String {
    if !is_valid_chilean_phone(phone) {
        return phone.to_string();
    }
    let cleaned = strip_separators(phone.trim());
    let digits = cleaned.trim_start_matches('+');
    let local = if digits.len() == 11 { &digits[3..] } else { &digits[1..] };
    format!("+56 9 {} {}", &local[..4], &local[4..])
}

/// Validates a Chilean RUT including its modulo-11 check digit
///
/// Accepts `12.345.678-5`, `12345678-5` and `123456785`.
pub fn is_valid_chilean_rut(rut: &str) -> bool {
    let normalized: String = rut.trim().chars().filter(|c| *c != '.').collect();
    if !normalized.is_ascii() {
        return false;
    }
    let (body, check) = match normalized.split_once('-') {
        Some((body, check)) => (body.to_string(), check.to_string()),
        None if normalized.len() >= 2 => {
            let split = normalized.len() - 1;
            (normalized[..split].to_string(), normalized[split..].to_string())
        }
        None => return false,
    };

    if !(7..=8).contains(&body.len()) || !body.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let check = check.to_ascii_uppercase();
    if check.len() != 1 {
        return false;
    }

    let mut sum = 0u32;
    let mut multiplier = 2u32;
    for digit in body.chars().rev().filter_map(|c| c.to_digit(10)) {
        sum += digit * multiplier;
        multiplier = if multiplier == 7 { 2 } else { multiplier + 1 };
    }
    let expected = match 11 - (sum % 11) {
        11 => "0".to_string(),
        10 => "K".to_string(),
        n => n.to_string(),
    };
    check == expected
}
