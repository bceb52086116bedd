//! Tagged result envelope for orchestrated operations.
//!
//! Every outcome the engine hands to observers travels as a [`Resource`]:
//! a status tag, an optional human-readable message, an optional payload
//! (which may be stale), and an optional transport status code. Constructed
//! fresh on every emission, never mutated afterwards.

mod bound;

pub use bound::{always_fetch, bound_resource, ignore_fetch_failure, BoundResource};

/// Outcome tag carried by every [`Resource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Loading,
}

/// Immutable result value communicating outcome and partial/stale data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource<T> {
    pub status: Status,
    pub message: Option<String>,
    pub data: Option<T>,
    /// Transport-level code, meaningful on SUCCESS/ERROR
    pub status_code: Option<u16>,
}

impl<T> Resource<T> {
    /// Successful outcome; the transport code defaults to 200.
    pub fn success(message: Option<String>, data: Option<T>) -> Self {
        Self::success_with_status(message, data, 200)
    }

    /// Successful outcome carrying an explicit transport code.
    pub const fn success_with_status(
        message: Option<String>,
        data: Option<T>,
        status_code: u16,
    ) -> Self {
        Self {
            status: Status::Success,
            message,
            data,
            status_code: Some(status_code),
        }
    }

    /// Failed outcome; `data` optionally carries the stale payload so
    /// consumers are not forced to discard what they had.
    pub fn error(message: impl Into<String>, status_code: Option<u16>, data: Option<T>) -> Self {
        Self {
            status: Status::Error,
            message: Some(message.into()),
            data,
            status_code,
        }
    }

    /// In-progress outcome, optionally carrying stale data for progressive UI.
    pub const fn loading(data: Option<T>) -> Self {
        Self {
            status: Status::Loading,
            message: None,
            data,
            status_code: None,
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self.status, Status::Success)
    }

    pub const fn is_error(&self) -> bool {
        matches!(self.status, Status::Error)
    }

    pub const fn is_loading(&self) -> bool {
        matches!(self.status, Status::Loading)
    }
}
