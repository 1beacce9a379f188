//! Errors of the scan pipeline.
//!
//! Poor scan quality is never an error; the pipeline degrades to fewer or no
//! lines instead. These variants cover input that cannot be a document at all,
//! and cancellation.

pub type Result<T> = std::result::Result<T, ScanError>;

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The payload parsed but does not describe a document.
    #[error("Malformed OCR payload: {0}")]
    MalformedPayload(String),

    /// A token's geometry is not finite or lies off the page.
    #[error("Corrupt geometry on page {page}, token {token}: {reason}")]
    CorruptGeometry {
        page: usize,
        token: usize,
        reason: String,
    },

    /// The caller withdrew the request.
    #[error("Scan cancelled")]
    Cancelled,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
