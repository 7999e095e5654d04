use miette::Diagnostic;
use thiserror::Error;

/// Main error type for pierogis operations
#[derive(Error, Diagnostic, Debug)]
pub enum PierogisError {
    #[error("IO error: {0}")]
    #[diagnostic(code(pierogis::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(pierogis::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Image error with {path}: {message}")]
    #[diagnostic(code(pierogis::image))]
    Image {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Parse error: {message}")]
    #[diagnostic(code(pierogis::parse))]
    Parse {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Invalid parameter: {message}")]
    #[diagnostic(code(pierogis::invalid_parameter))]
    InvalidParameter {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Invalid buffer shape: {message}")]
    #[diagnostic(code(pierogis::buffer_shape))]
    InvalidBufferShape { message: String },

    #[error("Shape mismatch: {message}")]
    #[diagnostic(code(pierogis::shape_mismatch))]
    ShapeMismatch {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Cooking was cancelled")]
    #[diagnostic(code(pierogis::cancelled))]
    Cancelled,
}

impl PierogisError {
    /// Shorthand for an [`PierogisError::InvalidParameter`] without help text.
    pub fn invalid(message: impl Into<String>) -> Self {
        PierogisError::InvalidParameter {
            message: message.into(),
            help: None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PierogisError>;
