//! Subscription handles
//!
//! A subscription is the control handle returned by subscribing a stream. It
//! detaches the observer from the subject, either explicitly through
//! [`Subscription::unsubscribe`] or automatically through a
//! [`SubscriptionGuard`].

/// Handle to cancel an active stream subscription.
pub trait Subscription {
  /// Detach the observer before the stream has completed. The observer is
  /// not notified.
  fn unsubscribe(self);

  /// Returns `true` once the subscription has been detached, either by
  /// unsubscribing, by completion or by the observer closing itself.
  fn is_closed(&self) -> bool;

  /// Activates "RAII" behavior for this subscription. That means
  /// `unsubscribe()` will be called automatically as soon as the returned
  /// value goes out of scope.
  ///
  /// **Attention:** If you don't assign the return value to a variable,
  /// `unsubscribe()` is called immediately, which is probably not what you
  /// want!
  fn unsubscribe_when_dropped(self) -> SubscriptionGuard<Self>
  where
    Self: Sized,
  {
    SubscriptionGuard::new(self)
  }
}

/// An RAII implementation of a "scoped subscribed" of a subscription.
/// When this structure is dropped (falls out of scope), the subscription will
/// be unsubscribed.
///
/// If you want to drop it immediately, wrap it in its own scope
#[derive(Debug)]
#[must_use]
pub struct SubscriptionGuard<T: Subscription>(Option<T>);

impl<T: Subscription> SubscriptionGuard<T> {
  /// Wraps an existing subscription with a guard to enable RAII behavior for
  /// it.
  pub fn new(subscription: T) -> SubscriptionGuard<T> { SubscriptionGuard(Some(subscription)) }

  /// Consumes the guard and returns the subscription without unsubscribing.
  pub fn into_inner(mut self) -> T {
    match self.0.take() {
      Some(subscription) => subscription,
      None => unreachable!("guard holds its subscription until dropped"),
    }
  }

  pub fn is_closed(&self) -> bool { self.0.as_ref().map_or(true, Subscription::is_closed) }
}

impl<T: Subscription> Drop for SubscriptionGuard<T> {
  #[inline]
  fn drop(&mut self) {
    if let Some(subscription) = self.0.take() {
      subscription.unsubscribe();
    }
  }
}
