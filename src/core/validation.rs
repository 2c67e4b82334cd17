//! Input rules shared by the client and the user service.
//!
//! Two username tiers exist: the store accepts any 1–50 char name, while the
//! registration form is stricter (3–50 chars, `[A-Za-z0-9_-]`).

use once_cell::sync::Lazy;
use regex::Regex;

pub const USERNAME_MAX: usize = 50;
pub const USERNAME_MIN: usize = 1;
pub const FORM_USERNAME_MIN: usize = 3;

static FORM_USERNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_-]+$").expect("username regex")
});

/// Store-level rule: 1..=50 chars after trimming.
pub fn validate_username(username: &str) -> Result<(), String> {
    let len = username.trim().chars().count();
    if len < USERNAME_MIN {
        return Err("Username is required".into());
    }
    if len > USERNAME_MAX {
        return Err(format!("Username must be at most {} characters", USERNAME_MAX));
    }
    Ok(())
}

/// Registration-form rule, checked before anything leaves the client.
pub fn validate_form_username(username: &str) -> Result<(), String> {
    let username = username.trim();
    validate_username(username)?;
    if username.chars().count() < FORM_USERNAME_MIN {
        return Err(format!("Username must be at least {} characters long", FORM_USERNAME_MIN));
    }
    if !FORM_USERNAME.is_match(username) {
        return Err("Username can only contain letters, numbers, underscores, and hyphens".into());
    }
    Ok(())
}

/// Absolute http(s) URL with a non-empty host part.
pub fn is_valid_url(candidate: &str) -> bool {
    let rest = candidate
        .strip_prefix("https://")
        .or_else(|| candidate.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or("");
            !host.is_empty() && !candidate.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
