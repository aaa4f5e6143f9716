//! The one-shot signal announcing that a subject has been disposed.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::{callback::Callback, chain::ChainSlot};

/// A second, independently published callback chain that is fired exactly
/// once.
///
/// Stream subscriptions register a listener here to learn about disposal and
/// detach themselves. Firing takes the whole chain out of the slot in one
/// atomic swap, so of several concurrent `fire` calls only one notifies.
#[derive(Default)]
pub struct TeardownSignal {
  listeners: ChainSlot<()>,
  fired: AtomicBool,
}

impl TeardownSignal {
  pub fn new() -> Self { Self::default() }

  /// Add a listener.
  ///
  /// Returns `false` if the signal has already fired (or fired while the
  /// listener was being added); the listener may or may not have been
  /// invoked in that case, so listeners must tolerate being told twice by
  /// their owner.
  pub fn register(&self, listener: &Callback<()>) -> bool {
    if self.fired.load(Ordering::SeqCst) {
      return false;
    }
    self.listeners.append(listener);
    if self.fired.load(Ordering::SeqCst) {
      self.listeners.remove(listener);
      return false;
    }
    true
  }

  pub fn unregister(&self, listener: &Callback<()>) {
    if !self.listeners.is_empty() {
      self.listeners.remove(listener);
    }
  }

  /// Fire the signal and return how many listeners this call notified.
  ///
  /// A panicking listener unwinds to the caller; the listeners after it are
  /// not notified and the signal stays fired.
  pub fn fire(&self) -> usize {
    self.fired.store(true, Ordering::SeqCst);
    let listeners = self.listeners.take();
    let notified = listeners.len();
    listeners.invoke(());
    notified
  }

  #[inline]
  pub fn listener_count(&self) -> usize { self.listeners.len() }
}
