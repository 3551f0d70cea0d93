use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MotifError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid symbol '{symbol}' at position {position}")]
    InvalidSymbol { position: usize, symbol: char },

    #[error("Degenerate motif: {0}")]
    DegenerateMotif(String),

    #[error("Invalid PWM format: {0}")]
    InvalidPwm(String),

    #[error("Invalid background model: {0}")]
    InvalidBackground(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Invalid parameter: {name} = {value}, {message}")]
    InvalidParameter {
        name: String,
        value: String,
        message: String,
    },

    #[error("Motif not found: {0}")]
    MotifNotFound(String),

    #[error("Scan cancelled")]
    Cancelled,
}

/// Type alias for Result with MotifError
pub type Result<T> = std::result::Result<T, MotifError>;

impl MotifError {
    /// Create a new InvalidSymbol error
    pub fn invalid_symbol(position: usize, symbol: u8) -> Self {
        MotifError::InvalidSymbol {
            position,
            symbol: symbol as char,
        }
    }

    /// Create a new InvalidPwm error
    pub fn invalid_pwm(message: impl Into<String>) -> Self {
        MotifError::InvalidPwm(message.into())
    }

    /// Create a new InvalidParameter error
    pub fn invalid_parameter(
        name: impl Into<String>,
        value: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        MotifError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            message: message.into(),
        }
    }
}
