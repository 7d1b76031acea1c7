//! Error types for the order signing pipeline.

use alloy_primitives::Address;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A field violates the fixed-width layout of the order encoding.
    #[error("Encoding error in `{field}`: {reason}")]
    Encoding { field: &'static str, reason: String },

    /// Reserved for failures of the hash primitive.
    #[error("Digest error: {message}")]
    Digest { message: String },

    #[error("Signing unavailable for {account}: {reason}")]
    SigningUnavailable { account: Address, reason: String },

    #[error("Signing rejected for {account}: {reason}")]
    SigningRejected { account: Address, reason: String },

    #[error("Signature recovers to {recovered}, expected {expected}")]
    SignatureMismatch {
        expected: Address,
        recovered: Address,
    },

    #[error("Invalid signature: {message}")]
    InvalidSignature { message: String },

    #[error("Invalid order: {message}")]
    InvalidOrder { message: String },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RPC error{}: {message}", rpc_code_suffix(.code))]
    Rpc { message: String, code: Option<i64> },

    #[error("Configuration file error: {0}")]
    ConfigFile(#[from] config::ConfigError),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    pub(crate) fn encoding(field: &'static str, reason: impl Into<String>) -> Self {
        Error::Encoding {
            field,
            reason: reason.into(),
        }
    }

    /// Whether the caller may recover by fixing the environment (unlocking an
    /// account, reconnecting) and running a fresh pipeline.
    ///
    /// Encoding failures and explicit rejections are never recoverable; the
    /// order has to be rebuilt or abandoned.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::SigningUnavailable { .. } | Error::Http(_))
    }
}

fn rpc_code_suffix(code: &Option<i64>) -> String {
    code.map(|c| format!(" {}", c)).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, Error>;
