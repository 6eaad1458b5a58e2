use std::path::PathBuf;

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BtcPayError {
    // 401, the server calls it "Unauthorized"
    #[error("unauthenticated")]
    Unauthenticated,

    // 403
    #[error("unauthorized")]
    Unauthorized,

    #[error("bad request")]
    BadRequest,

    #[error("not found")]
    NotFound,

    #[error("response status: {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("ReqwestError - {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to encode request - {0}")]
    Encoding(serde_json::Error),

    #[error("failed to decode response - {0}")]
    Decoding(serde_json::Error),

    #[error("URLParseError - {0}")]
    Url(#[from] url::ParseError),

    #[error("InvalidHeaderValueError - {0}")]
    InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),

    #[error("IoError - {0}")]
    Io(#[from] std::io::Error),

    #[error("created empty config file: {0}")]
    ConfigCreated(PathBuf),

    #[error("home dir not found")]
    HomeDirNotFound,

    #[error("auth check failed: {0}")]
    AuthCheck(String),

    #[error("invalid resource id: {0:?}")]
    InvalidId(String),

    #[error("BTCPay-Sig header missing")]
    SignatureMissing,

    #[error("HMAC mismatch")]
    SignatureMismatch,

    #[error("invoice store ID {actual} does not match selected store ID {expected}")]
    StoreMismatch { expected: String, actual: String },

    #[error("rate {rate} of {asset} exceeds ceiling {ceiling}")]
    RateExceedsCeiling {
        asset: String,
        rate: Decimal,
        ceiling: Decimal,
    },
}

impl BtcPayError {
    /// Errors reported by the server, as opposed to local failures.
    pub const fn is_server_rejection(&self) -> bool {
        matches!(
            self,
            Self::Unauthenticated
                | Self::Unauthorized
                | Self::BadRequest
                | Self::NotFound
                | Self::UnexpectedStatus { .. }
        )
    }

    pub const fn is_webhook_rejection(&self) -> bool {
        matches!(
            self,
            Self::SignatureMissing
                | Self::SignatureMismatch
                | Self::StoreMismatch { .. }
                | Self::RateExceedsCeiling { .. }
        )
    }
}
