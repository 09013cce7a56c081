use std::sync::LazyLock;

use regex::Regex;

use crate::utils::error::CustomError;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]{1,150}$").expect("username pattern"));

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]{1,50}$").expect("slug pattern"));

pub const GROUP_TITLE_MAX: usize = 200;

pub fn validate_password(password: &str) -> Result<(), CustomError> {
    // Check password length
    if password.len() < 8 || password.len() > 20 {
        return Err(CustomError::ValidationError(
            "Password must be between 8 and 20 characters long.".into(),
        ));
    }

    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_uppercase = password.chars().any(|c| c.is_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !has_lowercase || !has_uppercase || !has_digit {
        return Err(CustomError::ValidationError(
            "Password must include at least one uppercase letter, one lowercase letter, and one number.".into(),
        ));
    }

    Ok(())
}

/// Letters, digits and `@.+-_`, up to 150 characters.
pub fn validate_username(username: &str) -> Result<(), CustomError> {
    if !USERNAME_RE.is_match(username) {
        return Err(CustomError::ValidationError(
            "Username may contain only letters, numbers, and @/./+/-/_ characters (max 150).".into(),
        ));
    }
    Ok(())
}

pub fn validate_slug(slug: &str) -> Result<(), CustomError> {
    if !SLUG_RE.is_match(slug) {
        return Err(CustomError::ValidationError(
            "Slug may contain only letters, numbers, underscores or hyphens (max 50).".into(),
        ));
    }
    Ok(())
}
