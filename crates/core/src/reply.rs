//! The fixed reply-code vocabulary returned to clients.
//!
//! Responses are always a JSON object with a single `code` field. The codes
//! are a closed set inherited from the upstream protocol; clients match on
//! them programmatically, so the strings must never change.

use serde::Serialize;

/// Outcome codes for upload and dedup-check requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyCode {
    /// This owner already has this exact (hash, filename); nothing written.
    AlreadyOwned,
    /// Content existed server-side; ownership recorded without a transfer.
    InstantUpload,
    /// Content unknown (or dedup bookkeeping failed); full upload required.
    UploadRequired,
    /// Full upload pipeline completed.
    UploadOk,
    /// Full upload pipeline failed at some stage.
    UploadFailed,
    /// Session token missing, expired, or mismatched.
    TokenInvalid,
}

impl ReplyCode {
    /// Wire representation of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlreadyOwned => "005",
            Self::InstantUpload => "006",
            Self::UploadRequired => "007",
            Self::UploadOk => "008",
            Self::UploadFailed => "009",
            Self::TokenInvalid => "111",
        }
    }
}

/// JSON reply body: `{"code":"..."}`.
#[derive(Debug, Serialize)]
pub struct Reply {
    pub code: &'static str,
}

impl From<ReplyCode> for Reply {
    fn from(code: ReplyCode) -> Self {
        Self {
            code: code.as_str(),
        }
    }
}
