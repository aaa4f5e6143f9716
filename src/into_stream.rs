//! IntoStream
//!
//! Converts a [`SubjectObservable`] into a `futures::Stream`, so the values
//! of a subject can be consumed with `while let` loops and composed with the
//! `StreamExt` combinators.
//!
//! The stream is unbounded: every published value is queued until polled.
//! It ends when the subject is disposed, and dropping it detaches it from the
//! subject.
//!
//! # Example
//!
//! ```rust
//! use futures::{executor::block_on, StreamExt};
//! use event_subject::prelude::*;
//!
//! let subject = EventSubject::<i32>::new();
//! let stream = subject.observe().into_stream().unwrap();
//!
//! subject.publish(1).unwrap();
//! subject.publish(2).unwrap();
//! subject.dispose();
//!
//! let values: Vec<i32> = block_on(stream.map(|v| v * 10).collect());
//! assert_eq!(values, vec![10, 20]);
//! ```

use std::{
  collections::VecDeque,
  pin::Pin,
  sync::Arc,
  task::{Context, Poll, Waker},
};

use futures::stream::Stream;
use parking_lot::Mutex;

use crate::{
  error::DisposedError,
  observable::{SubjectObservable, SubjectSubscription},
  observer::Observer,
  subscription::Subscription,
};

/// State shared between the subject's subscription and the stream consumer.
struct IntoStreamState<T> {
  /// Values waiting to be polled.
  queue: VecDeque<T>,
  /// The waker of the task waiting on the stream.
  waker: Option<Waker>,
  /// Set once the subject has been disposed.
  is_closed: bool,
}

impl<T> Default for IntoStreamState<T> {
  fn default() -> Self { Self { queue: VecDeque::new(), waker: None, is_closed: false } }
}

/// A `Stream` yielding every value published to a subject.
///
/// Created by [`SubjectObservable::into_stream`]. Yields `None` once the
/// subject has been disposed and the queued values are drained.
pub struct SubjectStream<T> {
  state: Arc<Mutex<IntoStreamState<T>>>,
  subscription: Option<SubjectSubscription>,
}

impl<T> SubjectObservable<T>
where
  T: Send + 'static,
{
  /// Subscribe and expose the values as a `futures::Stream`.
  ///
  /// # Errors
  ///
  /// Returns [`DisposedError`] if the subject has already been disposed.
  pub fn into_stream(self) -> Result<SubjectStream<T>, DisposedError> {
    let state = Arc::new(Mutex::new(IntoStreamState::default()));
    let subscription = self.subscribe_with(IntoStreamObserver { state: state.clone() })?;
    Ok(SubjectStream { state, subscription: Some(subscription) })
  }
}

impl<T> Stream for SubjectStream<T> {
  type Item = T;

  fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
    let mut state = self.state.lock();

    if let Some(item) = state.queue.pop_front() {
      return Poll::Ready(Some(item));
    }

    if state.is_closed {
      return Poll::Ready(None);
    }

    state.waker = Some(cx.waker().clone());
    Poll::Pending
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    let state = self.state.lock();
    let queued = state.queue.len();
    if state.is_closed {
      (queued, Some(queued))
    } else {
      (queued, None)
    }
  }
}

impl<T> Drop for SubjectStream<T> {
  fn drop(&mut self) {
    if let Some(subscription) = self.subscription.take() {
      subscription.unsubscribe();
    }
  }
}

/// An `Observer` feeding the shared stream state.
struct IntoStreamObserver<T> {
  state: Arc<Mutex<IntoStreamState<T>>>,
}

impl<T> IntoStreamObserver<T> {
  fn wake(waker: Option<Waker>) {
    if let Some(waker) = waker {
      waker.wake();
    }
  }
}

impl<T> Observer<T> for IntoStreamObserver<T> {
  fn next(&mut self, value: T) {
    let waker = {
      let mut state = self.state.lock();
      state.queue.push_back(value);
      state.waker.take()
    };
    Self::wake(waker);
  }

  fn complete(self) {
    let waker = {
      let mut state = self.state.lock();
      state.is_closed = true;
      state.waker.take()
    };
    Self::wake(waker);
  }

  fn is_closed(&self) -> bool { false }
}
