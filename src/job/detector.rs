// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Change detection in front of the observer callback.

use crate::error::{BoxError, ObserverError};
use crate::payload::Payload;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// What an observer callback returns. `Err` marks the cycle as failed.
pub type ObserverResult = std::result::Result<(), BoxError>;

/// The callback registered with a job, receiving either raw bytes or text.
pub enum Observer {
    Binary(Box<dyn FnMut(&[u8]) -> ObserverResult + Send>),
    Text(Box<dyn FnMut(&str) -> ObserverResult + Send>),
}

impl Observer {
    pub fn binary<F>(f: F) -> Self
    where
        F: FnMut(&[u8]) -> ObserverResult + Send + 'static,
    {
        Self::Binary(Box::new(f))
    }

    pub fn text<F>(f: F) -> Self
    where
        F: FnMut(&str) -> ObserverResult + Send + 'static,
    {
        Self::Text(Box::new(f))
    }

    /// Call the observer. Panics are caught and reported as errors.
    fn notify(&mut self, payload: &Payload) -> Result<(), ObserverError> {
        let outcome = catch_unwind(AssertUnwindSafe(|| match self {
            Self::Binary(f) => f(payload.as_bytes()),
            Self::Text(f) => f(payload.text()),
        }));

        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(ObserverError::Rejected(e)),
            Err(panic) => Err(ObserverError::Panicked(panic_message(panic.as_ref()))),
        }
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary(_) => f.write_str("Observer::Binary"),
            Self::Text(_) => f.write_str("Observer::Text"),
        }
    }
}

/// Delivers a payload only if its fingerprint differs from the last delivered one.
///
/// Not synchronised: the owning job calls it from one task at a time.
#[derive(Debug)]
pub struct ChangeDetector {
    observer: Observer,
    last_delivered: Option<u64>,
}

impl ChangeDetector {
    pub fn new(observer: Observer) -> Self {
        Self {
            observer,
            last_delivered: None,
        }
    }

    /// Offer a payload. Returns `Ok(true)` if the observer was called.
    ///
    /// The stored fingerprint only moves once the observer accepted the data,
    /// so rejected content is offered again on the next cycle.
    pub fn offer(&mut self, payload: &Payload) -> Result<bool, ObserverError> {
        if self.last_delivered == Some(payload.fingerprint()) {
            return Ok(false);
        }
        self.observer.notify(payload)?;
        self.last_delivered = Some(payload.fingerprint());
        Ok(true)
    }

    /// Fingerprint of the last delivered payload.
    pub fn last_delivered(&self) -> Option<u64> {
        self.last_delivered
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
