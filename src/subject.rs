//! EventSubject: a disposable multicast slot of callbacks.
//!
//! The subject keeps the registered callbacks in an immutable
//! [`CallbackChain`](crate::chain::CallbackChain) published through a
//! [`ChainSlot`]. Broadcasting takes a snapshot of the slot and runs it on the
//! calling thread without touching any lock. Registration and removal are
//! serialized by a gate lock, which is never held while a callback runs.
//!
//! # Lifecycle
//!
//! ```text
//! Active --subscribe/unsubscribe/publish--> Active
//! Active --dispose--> Disposed (terminal)
//! Disposed --subscribe/publish--> Err(DisposedError)
//! Disposed --unsubscribe/dispose--> no-op
//! ```

use std::{
  fmt::{Debug, Formatter},
  ops::Deref,
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::{
  callback::Callback, chain::ChainSlot, error::DisposedError, observable::SubjectObservable,
  teardown::TeardownSignal,
};

// ============================================================================
// Seam traits
// ============================================================================

/// Push values to every current listener.
pub trait EventPublisher<T> {
  fn publish(&self, value: T) -> Result<(), DisposedError>;
}

/// Expose the notification stream as a cold stream description.
pub trait EventObservable<T> {
  fn observe(&self) -> SubjectObservable<T>;
}

/// Register and remove plain callbacks.
pub trait EventDelegate<T> {
  fn subscribe(&self, callback: &Callback<T>) -> Result<(), DisposedError>;

  fn unsubscribe(&self, callback: &Callback<T>);
}

/// Everything a subject offers: publishing, observing and callback
/// registration.
pub trait SubjectLike<T>: EventPublisher<T> + EventObservable<T> + EventDelegate<T> {}

impl<S, T> SubjectLike<T> for S where
  S: EventPublisher<T> + EventObservable<T> + EventDelegate<T>
{
}

// ============================================================================
// SubjectCore
// ============================================================================

/// State shared by every handle of one subject.
pub(crate) struct SubjectCore<T> {
  chain: ChainSlot<T>,
  pub(crate) teardown: TeardownSignal,
  disposed: AtomicBool,
  gate: Mutex<()>,
  type_name: &'static str,
}

impl<T> SubjectCore<T> {
  pub(crate) fn new(type_name: &'static str) -> Self {
    Self {
      chain: ChainSlot::new(),
      teardown: TeardownSignal::new(),
      disposed: AtomicBool::new(false),
      gate: Mutex::new(()),
      type_name,
    }
  }

  #[inline]
  pub(crate) fn is_disposed(&self) -> bool { self.disposed.load(Ordering::SeqCst) }

  pub(crate) fn check_disposed(&self) -> Result<(), DisposedError> {
    if self.is_disposed() {
      debug!(subject = self.type_name, "rejected: subject is disposed");
      Err(self.disposed_error())
    } else {
      Ok(())
    }
  }

  #[inline]
  pub(crate) fn disposed_error(&self) -> DisposedError { DisposedError::new(self.type_name) }

  pub(crate) fn subscribe(&self, callback: &Callback<T>) -> Result<(), DisposedError> {
    let _gate = self.gate.lock();
    // Checked under the gate so a concurrent dispose cannot slip in between
    // the check and the append.
    self.check_disposed()?;

    if self.chain.snapshot().contains(callback) {
      trace!(subject = self.type_name, "duplicate registration ignored");
      return Ok(());
    }
    self.chain.append(callback);
    trace!(subject = self.type_name, subscribers = self.chain.len(), "callback registered");
    Ok(())
  }

  pub(crate) fn unsubscribe(&self, callback: &Callback<T>) {
    let _gate = self.gate.lock();
    if self.chain.is_empty() {
      return;
    }
    self.chain.remove(callback);
    trace!(subject = self.type_name, subscribers = self.chain.len(), "callback unregistered");
  }

  pub(crate) fn publish(&self, value: T) -> Result<(), DisposedError>
  where
    T: Clone,
  {
    if self.is_disposed() {
      trace!(subject = self.type_name, "publish after dispose");
      return Err(self.disposed_error());
    }
    let chain = self.chain.snapshot();
    chain.invoke(value);
    Ok(())
  }

  /// Returns the number of teardown listeners notified by this call.
  pub(crate) fn dispose(&self) -> usize {
    let already = self.disposed.swap(true, Ordering::SeqCst);
    self.chain.clear();

    // Runs even when a teardown listener panics: a registration that passed
    // its disposed check just before the flag flipped may still be
    // appending, and the gate makes sure it has landed before clearing.
    let _reclear = ClearUnderGate(self);

    let notified = self.teardown.fire();
    if !already {
      debug!(subject = self.type_name, teardown = notified, "subject disposed");
    }
    notified
  }

  pub(crate) fn subscriber_count(&self) -> usize { self.chain.len() }
}

struct ClearUnderGate<'a, T>(&'a SubjectCore<T>);

impl<T> Drop for ClearUnderGate<'_, T> {
  fn drop(&mut self) {
    let _gate = self.0.gate.lock();
    self.0.chain.clear();
  }
}

impl<T> Drop for SubjectCore<T> {
  fn drop(&mut self) {
    if !self.is_disposed() {
      self.dispose();
    }
  }
}

// ============================================================================
// EventSubject
// ============================================================================

/// A thread-safe, disposable multicast subject.
///
/// Cloning an `EventSubject` yields another handle to the same subject.
/// When the last handle (including live stream descriptions) goes away the
/// subject disposes itself.
///
/// # Example
///
/// ```rust
/// use std::sync::{Arc, Mutex};
///
/// use event_subject::prelude::*;
///
/// let subject = EventSubject::<i32>::new();
/// let seen = Arc::new(Mutex::new(vec![]));
///
/// let c_seen = seen.clone();
/// let cb = Callback::new(move |v| c_seen.lock().unwrap().push(v));
/// subject.subscribe(&cb).unwrap();
/// subject.subscribe(&cb).unwrap(); // same registration, ignored
///
/// subject.publish(1).unwrap();
/// subject.unsubscribe(&cb);
/// subject.publish(2).unwrap();
///
/// assert_eq!(*seen.lock().unwrap(), vec![1]);
///
/// subject.dispose();
/// assert!(subject.publish(3).is_err());
/// ```
pub struct EventSubject<T> {
  pub(crate) core: Arc<SubjectCore<T>>,
}

impl<T> EventSubject<T> {
  pub fn new() -> Self { Self::named(std::any::type_name::<Self>()) }

  pub(crate) fn named(type_name: &'static str) -> Self {
    Self { core: Arc::new(SubjectCore::new(type_name)) }
  }

  /// Create a subject together with its stream description.
  pub fn create_and_observe() -> (Self, SubjectObservable<T>) {
    let subject = Self::new();
    let observable = subject.observe();
    (subject, observable)
  }

  /// Register `callback`.
  ///
  /// Registering a callback that is already registered (same identity) is a
  /// no-op.
  ///
  /// # Errors
  ///
  /// Returns [`DisposedError`] once the subject has been disposed.
  pub fn subscribe(&self, callback: &Callback<T>) -> Result<(), DisposedError> {
    self.core.subscribe(callback)
  }

  /// Remove `callback`. Never fails, also not after disposal.
  pub fn unsubscribe(&self, callback: &Callback<T>) { self.core.unsubscribe(callback) }

  /// Call every current callback with `value`, synchronously and in
  /// registration order.
  ///
  /// A panicking callback unwinds to the caller and skips the callbacks after
  /// it for this call only.
  ///
  /// # Errors
  ///
  /// Returns [`DisposedError`] once the subject has been disposed.
  pub fn publish(&self, value: T) -> Result<(), DisposedError>
  where
    T: Clone,
  {
    self.core.publish(value)
  }

  /// A cold stream of every value published from now on. Nothing happens
  /// until the returned description is subscribed.
  pub fn observe(&self) -> SubjectObservable<T> { SubjectObservable::new(self.core.clone()) }

  /// Permanently shut the subject down.
  ///
  /// Detaches every callback and completes every live stream subscription.
  /// Calling it again is a no-op. A panic raised by a stream observer's
  /// completion propagates to this call.
  pub fn dispose(&self) { self.core.dispose(); }

  pub fn is_disposed(&self) -> bool { self.core.is_disposed() }

  /// Number of registered callbacks, stream subscriptions included.
  pub fn subscriber_count(&self) -> usize { self.core.subscriber_count() }

  /// Dispose the subject as soon as the returned guard goes out of scope.
  pub fn dispose_on_drop(self) -> DisposeGuard<T> { DisposeGuard::new(self) }
}

impl<T> Default for EventSubject<T> {
  fn default() -> Self { Self::new() }
}

impl<T> Clone for EventSubject<T> {
  fn clone(&self) -> Self { Self { core: self.core.clone() } }
}

impl<T> Debug for EventSubject<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct(self.core.type_name)
      .field("disposed", &self.is_disposed())
      .field("subscribers", &self.subscriber_count())
      .finish()
  }
}

impl<T: Clone> EventPublisher<T> for EventSubject<T> {
  #[inline]
  fn publish(&self, value: T) -> Result<(), DisposedError> { EventSubject::publish(self, value) }
}

impl<T> EventObservable<T> for EventSubject<T> {
  #[inline]
  fn observe(&self) -> SubjectObservable<T> { EventSubject::observe(self) }
}

impl<T> EventDelegate<T> for EventSubject<T> {
  #[inline]
  fn subscribe(&self, callback: &Callback<T>) -> Result<(), DisposedError> {
    EventSubject::subscribe(self, callback)
  }

  #[inline]
  fn unsubscribe(&self, callback: &Callback<T>) { EventSubject::unsubscribe(self, callback) }
}

/// An RAII guard that disposes its subject when dropped.
///
/// If you want to dispose it immediately, wrap it in its own scope.
#[must_use]
pub struct DisposeGuard<T> {
  subject: EventSubject<T>,
  armed: bool,
}

impl<T> DisposeGuard<T> {
  fn new(subject: EventSubject<T>) -> Self { Self { subject, armed: true } }

  /// Give the subject back without disposing it.
  pub fn into_inner(mut self) -> EventSubject<T> {
    self.armed = false;
    self.subject.clone()
  }
}

impl<T> Deref for DisposeGuard<T> {
  type Target = EventSubject<T>;

  fn deref(&self) -> &Self::Target { &self.subject }
}

impl<T> Drop for DisposeGuard<T> {
  #[inline]
  fn drop(&mut self) {
    if self.armed {
      self.subject.dispose()
    }
  }
}
