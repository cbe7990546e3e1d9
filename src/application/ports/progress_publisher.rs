use crate::domain::ProgressEvent;

/// Outbound side of progress reporting.
///
/// Publishing never fails from the caller's point of view: delivery problems stay with the
/// implementation.
pub trait ProgressPublisher: Send + Sync {
    fn publish(&self, event: ProgressEvent);
}
