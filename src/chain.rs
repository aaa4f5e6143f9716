//! Immutable callback chains and their atomically published slot.
//!
//! A [`CallbackChain`] is never mutated once built: `append` and `remove`
//! return a new chain and leave the receiver untouched. A [`ChainSlot`] holds
//! the currently published chain, so a broadcast only has to take a snapshot
//! of the slot and may then run without any lock while registrations publish
//! replacement chains next to it.

use std::sync::Arc;

use arc_swap::ArcSwap;
use smallvec::SmallVec;

use crate::callback::Callback;

/// An ordered, possibly-empty sequence of callbacks.
///
/// # Example
///
/// ```rust
/// use event_subject::prelude::*;
///
/// let a = Callback::new(|v: i32| println!("a: {}", v));
/// let b = Callback::new(|v: i32| println!("b: {}", v));
///
/// let empty = CallbackChain::new();
/// let chain = empty.append(&a).append(&b);
/// assert_eq!(chain.len(), 2);
/// assert!(empty.is_empty());
///
/// let chain = chain.remove(&a);
/// assert!(!chain.contains(&a));
/// assert!(chain.contains(&b));
/// ```
pub struct CallbackChain<T> {
  entries: SmallVec<[Callback<T>; 4]>,
}

impl<T> Default for CallbackChain<T> {
  fn default() -> Self { Self { entries: SmallVec::new() } }
}

impl<T> Clone for CallbackChain<T> {
  fn clone(&self) -> Self { Self { entries: self.entries.clone() } }
}

impl<T> CallbackChain<T> {
  /// Create an empty chain.
  #[inline]
  pub fn new() -> Self { Self::default() }

  #[inline]
  pub fn len(&self) -> usize { self.entries.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  /// Returns `true` if `cb` (by identity) is part of this chain.
  pub fn contains(&self, cb: &Callback<T>) -> bool {
    self.entries.iter().rev().any(|entry| entry.ptr_eq(cb))
  }

  /// Returns a new chain holding every callback of `self` followed by `cb`.
  pub fn append(&self, cb: &Callback<T>) -> Self {
    let mut entries = SmallVec::with_capacity(self.entries.len() + 1);
    entries.extend(self.entries.iter().cloned());
    entries.push(cb.clone());
    Self { entries }
  }

  /// Returns a new chain without the most recently appended entry matching
  /// `cb`. Earlier matches are kept. Without any match the result is
  /// equivalent to `self`.
  pub fn remove(&self, cb: &Callback<T>) -> Self {
    let mut entries = self.entries.clone();
    if let Some(idx) = entries.iter().rposition(|entry| entry.ptr_eq(cb)) {
      entries.remove(idx);
    }
    Self { entries }
  }

  /// Call every callback in append order.
  ///
  /// The value is cloned for all callbacks except the last one, which
  /// receives the moved value. A panicking callback unwinds straight to the
  /// caller and the remaining callbacks of this invocation are skipped; the
  /// chain itself is unaffected.
  pub fn invoke(&self, value: T)
  where
    T: Clone,
  {
    let mut iter = self.entries.iter().peekable();
    while let Some(cb) = iter.next() {
      if iter.peek().is_some() {
        cb.call(value.clone());
      } else {
        cb.call(value);
        break;
      }
    }
  }
}

/// The single atomically swapped reference to the current chain.
///
/// Every update is a load, compute, compare-and-swap loop that retries when a
/// concurrent publisher replaced the chain in between, so no update is lost
/// and readers never block.
pub struct ChainSlot<T> {
  current: ArcSwap<CallbackChain<T>>,
}

impl<T> Default for ChainSlot<T> {
  fn default() -> Self { Self { current: ArcSwap::from_pointee(CallbackChain::new()) } }
}

impl<T> ChainSlot<T> {
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// Snapshot of the currently published chain.
  ///
  /// The snapshot stays valid and unchanged for as long as it is held, even
  /// if newer chains are published meanwhile.
  #[inline]
  pub fn snapshot(&self) -> Arc<CallbackChain<T>> { self.current.load_full() }

  /// Publish `f(current)` and return the chain it replaced.
  pub fn update<F>(&self, f: F) -> Arc<CallbackChain<T>>
  where
    F: Fn(&CallbackChain<T>) -> CallbackChain<T>,
  {
    self.current.rcu(|current| f(current))
  }

  pub fn append(&self, cb: &Callback<T>) { self.update(|chain| chain.append(cb)); }

  pub fn remove(&self, cb: &Callback<T>) { self.update(|chain| chain.remove(cb)); }

  /// Atomically replace the chain with an empty one and hand back what was
  /// published before. Of several concurrent callers exactly one receives a
  /// given non-empty chain.
  pub fn take(&self) -> Arc<CallbackChain<T>> {
    self.current.swap(Arc::new(CallbackChain::new()))
  }

  pub fn clear(&self) { self.current.store(Arc::new(CallbackChain::new())) }

  pub fn is_empty(&self) -> bool { self.current.load().is_empty() }

  pub fn len(&self) -> usize { self.current.load().len() }
}
