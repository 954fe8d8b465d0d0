mod types;
mod validator;

pub use types::*;
pub use validator::{validate, validate_bytes, ValidationError};
