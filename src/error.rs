//! The error raised once a subject has been shut down.

use thiserror::Error;

/// Returned by every operation that needs a live subject once the subject has
/// been disposed.
///
/// Disposal is terminal and intentional, so this is an expected signal that
/// the subject's lifetime has ended and never a transient fault worth
/// retrying.
///
/// # Example
/// ```
/// use event_subject::prelude::*;
///
/// let subject = EventSubject::<u8>::new();
/// subject.dispose();
///
/// let err = subject.publish(1).unwrap_err();
/// assert!(err.to_string().contains("EventSubject<u8>"));
/// assert_eq!(err.as_label(), "subject_disposed");
/// ```
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot access a disposed object: {type_name}")]
pub struct DisposedError {
  type_name: &'static str,
}

impl DisposedError {
  pub(crate) fn new(type_name: &'static str) -> Self { Self { type_name } }

  /// Full type name of the disposed subject, element type included.
  pub fn type_name(&self) -> &'static str { self.type_name }

  /// Short stable label (snake_case) for use in logs.
  pub fn as_label(&self) -> &'static str { "subject_disposed" }
}
