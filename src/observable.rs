//! The stream face of a subject.
//!
//! [`EventSubject::observe`](crate::subject::EventSubject::observe) returns a
//! [`SubjectObservable`]: a cold description that has no effect until it is
//! subscribed. Every subscription registers two callbacks of its own with the
//! subject:
//!
//! - a teardown listener, which completes the observer when the subject is
//!   disposed (the "take until disposed" notifier), and
//! - a forwarding callback, which hands every published value to the
//!   observer.
//!
//! The listener is registered first, so a subject that gets disposed while a
//! subscription is being set up still completes that subscription.

use std::{
  cell::RefCell,
  fmt::{Debug, Formatter},
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Weak,
  },
};

use parking_lot::{Mutex, ReentrantMutex};
use tracing::trace;

use crate::{
  callback::Callback,
  error::DisposedError,
  observer::{AllObserver, FnNextObserver, Observer},
  subject::SubjectCore,
  subscription::Subscription,
};

/// A cold, re-subscribable stream of the values published to a subject.
///
/// `subscribe*` consumes the description, so clone it to subscribe more than
/// once; each subscription is independent.
///
/// # Example
///
/// ```rust
/// use std::sync::{Arc, Mutex};
///
/// use event_subject::prelude::*;
///
/// let subject = EventSubject::<&'static str>::new();
/// let seen = Arc::new(Mutex::new(vec![]));
/// let completed = Arc::new(Mutex::new(false));
///
/// let (c_seen, c_completed) = (seen.clone(), completed.clone());
/// subject
///   .observe()
///   .subscribe_all(
///     move |v| c_seen.lock().unwrap().push(v),
///     move || *c_completed.lock().unwrap() = true,
///   )
///   .unwrap();
///
/// subject.publish("x").unwrap();
/// subject.dispose();
///
/// assert_eq!(*seen.lock().unwrap(), vec!["x"]);
/// assert!(*completed.lock().unwrap());
/// ```
pub struct SubjectObservable<T> {
  core: Arc<SubjectCore<T>>,
}

impl<T> Clone for SubjectObservable<T> {
  fn clone(&self) -> Self { Self { core: self.core.clone() } }
}

impl<T> Debug for SubjectObservable<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SubjectObservable")
      .field("disposed", &self.core.is_disposed())
      .finish()
  }
}

impl<T> SubjectObservable<T> {
  pub(crate) fn new(core: Arc<SubjectCore<T>>) -> Self { Self { core } }
}

impl<T> SubjectObservable<T>
where
  T: Send + 'static,
{
  /// Subscribe with a value handler only.
  ///
  /// # Errors
  ///
  /// Returns [`DisposedError`] if the subject has already been disposed.
  pub fn subscribe<N>(self, next: N) -> Result<SubjectSubscription, DisposedError>
  where
    N: FnMut(T) + Send + 'static,
  {
    self.subscribe_with(FnNextObserver(next))
  }

  /// Subscribe with a value handler and a completion handler.
  ///
  /// * `complete`: runs once when the subject is disposed.
  ///
  /// # Errors
  ///
  /// Returns [`DisposedError`] if the subject has already been disposed.
  pub fn subscribe_all<N, C>(
    self,
    next: N,
    complete: C,
  ) -> Result<SubjectSubscription, DisposedError>
  where
    N: FnMut(T) + Send + 'static,
    C: FnOnce() + Send + 'static,
  {
    self.subscribe_with(AllObserver::new(next, complete))
  }

  /// Subscribe an [`Observer`].
  ///
  /// # Errors
  ///
  /// Returns [`DisposedError`] if the subject has already been disposed; the
  /// observer is dropped without being notified.
  pub fn subscribe_with<O>(self, observer: O) -> Result<SubjectSubscription, DisposedError>
  where
    O: Observer<T> + Send + 'static,
  {
    let core = self.core;
    core.check_disposed()?;

    let link = Arc::new(StreamLink::new(observer));
    let forward = {
      let link = link.clone();
      Callback::new(move |value: T| link.forward(value))
    };
    let teardown = {
      let link = link.clone();
      Callback::new(move |_: ()| link.complete())
    };
    link.attach(Registration {
      core: Arc::downgrade(&core),
      forward: forward.clone(),
      teardown: teardown.clone(),
    });

    if !core.teardown.register(&teardown) {
      // Disposed between the check above and the registration.
      link.complete();
    } else if core.subscribe(&forward).is_err() {
      // Disposed meanwhile; the teardown listener has completed or is about
      // to complete the observer, completing here again is harmless.
      link.complete();
    } else {
      trace!(subscribers = core.subscriber_count(), "stream subscription attached");
    }

    Ok(SubjectSubscription { link })
  }
}

// ============================================================================
// StreamLink
// ============================================================================

/// The callbacks one stream subscription has placed with its subject.
struct Registration<T> {
  core: Weak<SubjectCore<T>>,
  forward: Callback<T>,
  teardown: Callback<()>,
}

impl<T> Registration<T> {
  fn release(self) {
    if let Some(core) = self.core.upgrade() {
      core.unsubscribe(&self.forward);
      core.teardown.unregister(&self.teardown);
      trace!(subscribers = core.subscriber_count(), "stream subscription detached");
    }
  }
}

/// Shared state between the subject's callbacks and the subscription handle.
///
/// The observer sits behind a reentrant lock so publishes from several
/// threads reach it one at a time, while a disposal triggered from inside the
/// observer's own `next` can still get in: completion is then left to the
/// `next` call in progress.
struct StreamLink<T, O> {
  observer: ReentrantMutex<RefCell<Option<O>>>,
  /// No further values are delivered once set.
  closed: AtomicBool,
  /// Set together with `closed` when the subject has been disposed.
  completing: AtomicBool,
  registration: Mutex<Option<Registration<T>>>,
}

impl<T, O> StreamLink<T, O>
where
  O: Observer<T>,
{
  fn new(observer: O) -> Self {
    Self {
      observer: ReentrantMutex::new(RefCell::new(Some(observer))),
      closed: AtomicBool::new(false),
      completing: AtomicBool::new(false),
      registration: Mutex::new(None),
    }
  }

  fn attach(&self, registration: Registration<T>) {
    *self.registration.lock() = Some(registration);
  }

  /// Remove both callbacks from the subject. Also breaks the reference cycle
  /// between this link and the callbacks capturing it.
  fn detach(&self) {
    let registration = self.registration.lock().take();
    if let Some(registration) = registration {
      registration.release();
    }
  }

  fn forward(&self, value: T) {
    if self.closed.load(Ordering::SeqCst) {
      return;
    }
    let guard = self.observer.lock();
    let Ok(mut slot) = guard.try_borrow_mut() else {
      panic!(
        "re-entrant emissions into a stream observer are not supported. Publish from outside the \
         observer's `next`, or hand the value to another thread or task first."
      );
    };
    let Some(observer) = slot.as_mut() else { return };
    observer.next(value);

    let closed_itself = observer.is_closed();
    if !closed_itself && !self.closed.load(Ordering::SeqCst) {
      return;
    }
    self.closed.store(true, Ordering::SeqCst);
    let observer = slot.take();
    drop(slot);
    drop(guard);

    self.detach();
    if let Some(observer) = observer {
      if !closed_itself && self.completing.load(Ordering::SeqCst) {
        observer.complete();
      }
    }
  }

  fn complete(&self) {
    self.completing.store(true, Ordering::SeqCst);
    self.closed.store(true, Ordering::SeqCst);
    self.detach();

    let observer = {
      let guard = self.observer.lock();
      let taken = match guard.try_borrow_mut() {
        Ok(mut slot) => slot.take(),
        // Inside this observer's own `next`: it completes once `next`
        // returns.
        Err(_) => None,
      };
      taken
    };
    if let Some(observer) = observer {
      observer.complete();
    }
  }

  fn unsubscribe(&self) {
    self.closed.store(true, Ordering::SeqCst);
    self.detach();

    let observer = {
      let guard = self.observer.lock();
      let taken = match guard.try_borrow_mut() {
        Ok(mut slot) => slot.take(),
        Err(_) => None,
      };
      taken
    };
    drop(observer);
  }

  fn is_closed(&self) -> bool { self.closed.load(Ordering::SeqCst) }
}

/// Type-erased control over a [`StreamLink`].
trait LinkControl: Send + Sync {
  fn unsubscribe(&self);

  fn is_closed(&self) -> bool;
}

impl<T, O> LinkControl for StreamLink<T, O>
where
  T: Send + 'static,
  O: Observer<T> + Send + 'static,
{
  fn unsubscribe(&self) { StreamLink::unsubscribe(self) }

  fn is_closed(&self) -> bool { StreamLink::is_closed(self) }
}

// ============================================================================
// SubjectSubscription
// ============================================================================

/// Subscription handle for one stream subscription.
///
/// Dropping the handle does not detach the observer; call
/// [`Subscription::unsubscribe`] or use
/// [`Subscription::unsubscribe_when_dropped`] for that.
pub struct SubjectSubscription {
  link: Arc<dyn LinkControl>,
}

impl Subscription for SubjectSubscription {
  fn unsubscribe(self) { self.link.unsubscribe() }

  fn is_closed(&self) -> bool { self.link.is_closed() }
}

impl Debug for SubjectSubscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SubjectSubscription")
      .field("is_closed", &self.is_closed())
      .finish()
  }
}
