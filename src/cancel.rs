// src/cancel.rs

use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation, polled between pages and between strategies.
pub trait CancelCheck: Sync {
    fn is_cancelled(&self) -> bool;
}

impl CancelCheck for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

/// For callers that never cancel.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl CancelCheck for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}
