use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum DomainError {
    #[error("invalid color `{value}`: expected #rrggbb or #rrggbbaa")]
    InvalidColor { value: String },
    #[error("domain validation failed: {message}")]
    Validation { message: String },
}

impl DomainError {
    pub fn invalid_color(value: impl Into<String>) -> Self {
        Self::InvalidColor {
            value: value.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
