//! # event-subject: disposable multicast events for Rust
//!
//! A thread-safe notification slot: register callbacks, broadcast values to
//! all of them synchronously, and shut the whole thing down once, notifying
//! every live stream subscription on the way out.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use event_subject::prelude::*;
//!
//! let subject = EventSubject::<i32>::new();
//! let seen = Arc::new(Mutex::new(vec![]));
//!
//! let c_seen = seen.clone();
//! subject
//!   .observe()
//!   .subscribe(move |v| c_seen.lock().unwrap().push(v))
//!   .unwrap();
//!
//! subject.publish(1).unwrap();
//! subject.publish(2).unwrap();
//! subject.dispose();
//!
//! assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
//! assert!(subject.publish(3).is_err());
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`EventSubject`] | The subject: subscribe / unsubscribe / publish / observe / dispose |
//! | [`Callback`] | Identity-compared callback handle |
//! | [`CallbackChain`] | Immutable chain of callbacks, published atomically |
//! | [`SubjectObservable`] | Cold stream description, completes on disposal |
//! | [`PatternSubject`] | Two-argument `(sender, args)` handlers on the same machinery |
//! | [`DisposedError`] | The only error: the subject has been shut down |
//!
//! ## Concurrency
//!
//! `publish` takes a snapshot of the current chain and never waits on a
//! lock; registrations are serialized by a gate lock that is never held
//! while callbacks run, so callbacks may subscribe and unsubscribe freely.
//! Everything runs on the calling thread.
//!
//! ## Feature Flags
//!
//! - **`stream`** (default): `SubjectObservable::into_stream`, a
//!   `futures::Stream` bridge
//!
//! [`EventSubject`]: prelude::EventSubject
//! [`Callback`]: prelude::Callback
//! [`CallbackChain`]: prelude::CallbackChain
//! [`SubjectObservable`]: prelude::SubjectObservable
//! [`PatternSubject`]: prelude::PatternSubject
//! [`DisposedError`]: prelude::DisposedError

pub mod callback;
pub mod chain;
pub mod error;
#[cfg(feature = "stream")]
pub mod into_stream;
pub mod observable;
pub mod observer;
pub mod pattern;
pub mod prelude;
pub mod subject;
pub mod subscription;
pub mod teardown;

// Re-export the prelude module
pub use prelude::*;
