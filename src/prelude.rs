//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Callbacks and chains
pub use crate::callback::Callback;
pub use crate::chain::{CallbackChain, ChainSlot};
// Error
pub use crate::error::DisposedError;
// Stream bridge
#[cfg(feature = "stream")]
pub use crate::into_stream::SubjectStream;
// Stream description
pub use crate::observable::{SubjectObservable, SubjectSubscription};
// Observer trait
pub use crate::observer::{AllObserver, FnNextObserver, Observer};
// Two-argument handlers
pub use crate::pattern::{EventPattern, PatternHandler, PatternSubject};
// Subject
pub use crate::subject::{
  DisposeGuard, EventDelegate, EventObservable, EventPublisher, EventSubject, SubjectLike,
};
// Subscription
pub use crate::subscription::{Subscription, SubscriptionGuard};
pub use crate::teardown::TeardownSignal;
