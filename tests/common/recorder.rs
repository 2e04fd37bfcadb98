//! Recording observer for testing.
//!
//! Records every delivery for assertions. Can be told to reject or panic
//! on specific content to exercise the failure paths of a cycle.

use data_replicator::ObserverResult;
use std::sync::{Arc, Mutex};

/// How the recorder reacts to a delivery.
#[derive(Debug, Clone, Default)]
enum Behaviour {
    #[default]
    Accept,
    RejectContaining(String),
    PanicContaining(String),
}

/// Shared record of delivered texts.
///
/// # Example
/// ```rust,ignore
/// let recorder = Recorder::new();
/// let job = ReplicationJob::source(url)
///     .start_consuming_text(recorder.observer())
///     .await?;
/// assert_eq!(recorder.deliveries(), vec!["A=1"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    deliveries: Arc<Mutex<Vec<String>>>,
    attempts: Arc<Mutex<usize>>,
    behaviour: Arc<Mutex<Behaviour>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject (return an error for) any text containing `needle`.
    pub fn reject_containing(&self, needle: &str) {
        *self.behaviour.lock().unwrap() = Behaviour::RejectContaining(needle.to_string());
    }

    /// Panic on any text containing `needle`.
    pub fn panic_containing(&self, needle: &str) {
        *self.behaviour.lock().unwrap() = Behaviour::PanicContaining(needle.to_string());
    }

    pub fn accept_all(&self) {
        *self.behaviour.lock().unwrap() = Behaviour::Accept;
    }

    /// A text observer feeding this recorder.
    pub fn observer(&self) -> impl FnMut(&str) -> ObserverResult + Send + 'static {
        let recorder = self.clone();
        move |text: &str| recorder.handle(text)
    }

    fn handle(&self, text: &str) -> ObserverResult {
        *self.attempts.lock().unwrap() += 1;
        let behaviour = self.behaviour.lock().unwrap().clone();
        match behaviour {
            Behaviour::RejectContaining(needle) if text.contains(&needle) => {
                Err(format!("rejected content containing {:?}", needle).into())
            }
            Behaviour::PanicContaining(needle) if text.contains(&needle) => {
                panic!("observer blew up on {:?}", needle)
            }
            _ => {
                self.deliveries.lock().unwrap().push(text.to_string());
                Ok(())
            }
        }
    }

    /// Accepted deliveries, in order.
    pub fn deliveries(&self) -> Vec<String> {
        self.deliveries.lock().unwrap().clone()
    }

    pub fn delivery_count(&self) -> usize {
        self.deliveries.lock().unwrap().len()
    }

    /// Calls including rejected and panicking ones.
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }

    pub fn last(&self) -> Option<String> {
        self.deliveries.lock().unwrap().last().cloned()
    }
}
