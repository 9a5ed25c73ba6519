//! Pure functions over board values.

use validator::ValidateEmail;

/// Maximum length of a micropost body, counted in characters.
pub const MICROPOST_MAX_CHARS: usize = 140;

/// Case-folds an email so that uniqueness is decided on one canonical form.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Maximum length of an email address, counted in characters.
pub const EMAIL_MAX_CHARS: usize = 255;

/// Checks email syntax (HTML5 rules) and requires a dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    if !email.validate_email() {
        return false;
    }

    matches!(email.rsplit_once('@'), Some((_, domain)) if domain.contains('.'))
}

/// Builds the greeting returned by the hello endpoint.
pub fn hello_message(name: &str) -> String {
    format!("Hello!{name}")
}
