//! Identity-compared callback handles
//!
//! Closures have no meaningful equality in Rust, so a registered callback is
//! identified by the allocation that holds it. Cloning a [`Callback`] yields a
//! handle to the *same* registration; wrapping the same closure body twice
//! yields two distinct registrations.

use std::{
  fmt::{Debug, Formatter},
  hash::{Hash, Hasher},
  sync::Arc,
};

/// A shareable notification function of shape `T -> ()`.
pub struct Callback<T>(Arc<dyn Fn(T) + Send + Sync>);

impl<T> Callback<T> {
  pub fn new<F>(f: F) -> Self
  where
    F: Fn(T) + Send + Sync + 'static,
  {
    Callback(Arc::new(f))
  }

  /// Invoke the wrapped function.
  #[inline]
  pub fn call(&self, value: T) { (self.0)(value) }

  /// Returns `true` if both handles refer to the same registration.
  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool { self.addr() == other.addr() }

  // Only the data pointer is compared: vtable pointers of the same closure
  // type are not guaranteed to be unique across codegen units.
  #[inline]
  fn addr(&self) -> *const () { Arc::as_ptr(&self.0) as *const () }
}

impl<T> Clone for Callback<T> {
  #[inline]
  fn clone(&self) -> Self { Callback(self.0.clone()) }
}

impl<T> PartialEq for Callback<T> {
  #[inline]
  fn eq(&self, other: &Self) -> bool { self.ptr_eq(other) }
}

impl<T> Eq for Callback<T> {}

impl<T> Hash for Callback<T> {
  fn hash<H: Hasher>(&self, state: &mut H) { (self.addr() as usize).hash(state) }
}

impl<T> Debug for Callback<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_tuple("Callback").field(&self.addr()).finish()
  }
}
