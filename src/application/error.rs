use std::error::Error as StdError;

use thiserror::Error;

use crate::{application::render::RenderError, config::LoadError, infra::error::InfraError};

/// An error flattened into its message chain, outermost first.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }

    /// The message chain joined with `: `.
    pub fn chain(&self) -> String {
        self.messages.join(": ")
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("failed to load configuration")]
    Config(#[from] LoadError),
    #[error("failed to render `{input}`")]
    Render {
        input: String,
        #[source]
        source: RenderError,
    },
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn render(input: impl Into<String>, source: RenderError) -> Self {
        Self::Render {
            input: input.into(),
            source,
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Process exit status for this error, following the BSD `sysexits` codes.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Render { source, .. } if source.is_cancelled() => 75,
            AppError::Render { .. } => 65,
            AppError::Infra(InfraError::Io(_)) => 74,
            AppError::Config(_) | AppError::Infra(InfraError::Configuration { .. }) => 78,
            AppError::Infra(InfraError::Telemetry(_)) | AppError::Unexpected(_) => 70,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::from_error("application::error::AppError", self)
    }
}
