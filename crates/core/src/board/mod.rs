mod error;
mod operations;
mod types;
mod validation;

pub use error::ValidationError;
pub use operations::{
    hello_message, is_valid_email, normalize_email, EMAIL_MAX_CHARS, MICROPOST_MAX_CHARS,
};
pub use types::{Micropost, UniquenessClaim, User};
pub use validation::{validate, FieldRules, Rule, HELLO_RULES, MICROPOST_RULES, USER_RULES};
