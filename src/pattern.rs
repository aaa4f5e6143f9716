//! PatternSubject: two-argument `(sender, args)` handlers on top of an
//! [`EventSubject`].
//!
//! Handlers of shape `Fn(sender, args)` are bridged into the single-value
//! chain through a proxy whose identity is the identity of the handler it
//! wraps. Registering the same handler twice therefore collapses into one
//! registration, exactly like the plain [`Callback`] registrations do, while
//! two distinct handlers stay distinct even if they do the same thing.

use std::{
  borrow::Borrow,
  collections::HashSet,
  fmt::{Debug, Formatter},
  hash::{Hash, Hasher},
  sync::Arc,
};

use parking_lot::Mutex;
use tracing::trace;

use crate::{
  callback::Callback,
  error::DisposedError,
  observable::SubjectObservable,
  subject::{EventDelegate, EventObservable, EventPublisher, EventSubject},
};

/// A value published by a [`PatternSubject`]: who raised it and its payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EventPattern<S, A> {
  pub sender: S,
  pub args: A,
}

impl<S, A> EventPattern<S, A> {
  pub fn new(sender: S, args: A) -> Self { Self { sender, args } }
}

/// An identity-compared handler of shape `(sender, args) -> ()`.
pub struct PatternHandler<S, A>(Arc<dyn Fn(S, A) + Send + Sync>);

impl<S, A> PatternHandler<S, A> {
  pub fn new<F>(f: F) -> Self
  where
    F: Fn(S, A) + Send + Sync + 'static,
  {
    PatternHandler(Arc::new(f))
  }

  #[inline]
  pub fn call(&self, sender: S, args: A) { (self.0)(sender, args) }

  #[inline]
  fn addr(&self) -> *const () { Arc::as_ptr(&self.0) as *const () }
}

impl<S, A> Clone for PatternHandler<S, A> {
  fn clone(&self) -> Self { PatternHandler(self.0.clone()) }
}

impl<S, A> PartialEq for PatternHandler<S, A> {
  fn eq(&self, other: &Self) -> bool { self.addr() == other.addr() }
}

impl<S, A> Eq for PatternHandler<S, A> {}

impl<S, A> Hash for PatternHandler<S, A> {
  fn hash<H: Hasher>(&self, state: &mut H) { (self.addr() as usize).hash(state) }
}

impl<S, A> Debug for PatternHandler<S, A> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_tuple("PatternHandler").field(&self.addr()).finish()
  }
}

/// The bridging entry for one handler.
///
/// Equality and hashing only look at the wrapped handler, so a proxy can be
/// looked up by its handler alone.
struct PatternProxy<S, A> {
  handler: PatternHandler<S, A>,
  forward: Callback<EventPattern<S, A>>,
}

impl<S, A> PatternProxy<S, A>
where
  S: 'static,
  A: 'static,
{
  fn new(handler: PatternHandler<S, A>) -> Self {
    let target = handler.clone();
    let forward = Callback::new(move |pattern: EventPattern<S, A>| {
      target.call(pattern.sender, pattern.args)
    });
    Self { handler, forward }
  }
}

impl<S, A> PartialEq for PatternProxy<S, A> {
  fn eq(&self, other: &Self) -> bool { self.handler == other.handler }
}

impl<S, A> Eq for PatternProxy<S, A> {}

impl<S, A> Hash for PatternProxy<S, A> {
  fn hash<H: Hasher>(&self, state: &mut H) { self.handler.hash(state) }
}

impl<S, A> Borrow<PatternHandler<S, A>> for PatternProxy<S, A> {
  fn borrow(&self) -> &PatternHandler<S, A> { &self.handler }
}

/// A disposable subject of [`EventPattern`]s accepting two-argument handlers.
///
/// # Example
///
/// ```rust
/// use std::sync::{
///   atomic::{AtomicUsize, Ordering},
///   Arc,
/// };
///
/// use event_subject::prelude::*;
///
/// let subject = PatternSubject::<&'static str, u32>::new();
/// let total = Arc::new(AtomicUsize::new(0));
///
/// let c_total = total.clone();
/// let handler = PatternHandler::new(move |_sender, amount| {
///   c_total.fetch_add(amount as usize, Ordering::SeqCst);
/// });
/// subject.add_handler(&handler).unwrap();
/// subject.add_handler(&handler).unwrap();
///
/// subject.publish_pattern("button", 5).unwrap();
/// assert_eq!(total.load(Ordering::SeqCst), 5);
///
/// subject.remove_handler(&handler);
/// subject.publish_pattern("button", 5).unwrap();
/// assert_eq!(total.load(Ordering::SeqCst), 5);
/// ```
pub struct PatternSubject<S, A> {
  subject: EventSubject<EventPattern<S, A>>,
  proxies: Arc<Mutex<HashSet<PatternProxy<S, A>>>>,
}

impl<S, A> PatternSubject<S, A>
where
  S: 'static,
  A: 'static,
{
  pub fn new() -> Self {
    Self {
      subject: EventSubject::named(std::any::type_name::<Self>()),
      proxies: Arc::new(Mutex::new(HashSet::new())),
    }
  }

  /// Register a two-argument handler. Registering the same handler again is
  /// a no-op.
  ///
  /// # Errors
  ///
  /// Returns [`DisposedError`] once the subject has been disposed.
  pub fn add_handler(&self, handler: &PatternHandler<S, A>) -> Result<(), DisposedError> {
    let mut proxies = self.proxies.lock();
    self.subject.core.check_disposed()?;

    if proxies.contains(handler) {
      trace!(handlers = proxies.len(), "duplicate pattern handler ignored");
      return Ok(());
    }
    let proxy = PatternProxy::new(handler.clone());
    self.subject.subscribe(&proxy.forward)?;
    proxies.insert(proxy);
    trace!(handlers = proxies.len(), "pattern handler registered");
    Ok(())
  }

  /// Remove a two-argument handler. Never fails.
  pub fn remove_handler(&self, handler: &PatternHandler<S, A>) {
    let mut proxies = self.proxies.lock();
    if let Some(proxy) = proxies.take(handler) {
      self.subject.unsubscribe(&proxy.forward);
      trace!(handlers = proxies.len(), "pattern handler unregistered");
    }
  }

  /// Publish `EventPattern { sender, args }`.
  ///
  /// # Errors
  ///
  /// Returns [`DisposedError`] once the subject has been disposed.
  pub fn publish_pattern(&self, sender: S, args: A) -> Result<(), DisposedError>
  where
    S: Clone,
    A: Clone,
  {
    self.subject.publish(EventPattern::new(sender, args))
  }

  /// Number of bridged two-argument handlers.
  pub fn handler_count(&self) -> usize { self.proxies.lock().len() }
}

impl<S, A> PatternSubject<S, A> {
  /// Register a plain callback receiving whole [`EventPattern`]s.
  ///
  /// # Errors
  ///
  /// Returns [`DisposedError`] once the subject has been disposed.
  pub fn subscribe(&self, callback: &Callback<EventPattern<S, A>>) -> Result<(), DisposedError> {
    self.subject.subscribe(callback)
  }

  pub fn unsubscribe(&self, callback: &Callback<EventPattern<S, A>>) {
    self.subject.unsubscribe(callback)
  }

  /// # Errors
  ///
  /// Returns [`DisposedError`] once the subject has been disposed.
  pub fn publish(&self, pattern: EventPattern<S, A>) -> Result<(), DisposedError>
  where
    S: Clone,
    A: Clone,
  {
    self.subject.publish(pattern)
  }

  pub fn observe(&self) -> SubjectObservable<EventPattern<S, A>> { self.subject.observe() }

  /// Dispose the underlying subject and forget every bridged handler.
  pub fn dispose(&self) {
    let _forget = ClearProxies(&self.proxies);
    self.subject.dispose();
  }

  pub fn is_disposed(&self) -> bool { self.subject.is_disposed() }
}

// Clears the tracking set even if a teardown listener panics.
struct ClearProxies<'a, S, A>(&'a Mutex<HashSet<PatternProxy<S, A>>>);

impl<S, A> Drop for ClearProxies<'_, S, A> {
  fn drop(&mut self) { self.0.lock().clear() }
}

impl<S: 'static, A: 'static> Default for PatternSubject<S, A> {
  fn default() -> Self { Self::new() }
}

impl<S, A> Clone for PatternSubject<S, A> {
  fn clone(&self) -> Self { Self { subject: self.subject.clone(), proxies: self.proxies.clone() } }
}

impl<S, A> Debug for PatternSubject<S, A> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PatternSubject")
      .field("disposed", &self.is_disposed())
      .field("handlers", &self.proxies.lock().len())
      .finish()
  }
}

impl<S: Clone, A: Clone> EventPublisher<EventPattern<S, A>> for PatternSubject<S, A> {
  #[inline]
  fn publish(&self, value: EventPattern<S, A>) -> Result<(), DisposedError> {
    PatternSubject::publish(self, value)
  }
}

impl<S, A> EventObservable<EventPattern<S, A>> for PatternSubject<S, A> {
  #[inline]
  fn observe(&self) -> SubjectObservable<EventPattern<S, A>> { PatternSubject::observe(self) }
}

impl<S, A> EventDelegate<EventPattern<S, A>> for PatternSubject<S, A> {
  #[inline]
  fn subscribe(&self, callback: &Callback<EventPattern<S, A>>) -> Result<(), DisposedError> {
    PatternSubject::subscribe(self, callback)
  }

  #[inline]
  fn unsubscribe(&self, callback: &Callback<EventPattern<S, A>>) {
    PatternSubject::unsubscribe(self, callback)
  }
}
