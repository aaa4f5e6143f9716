//! Observer trait and closure adapters
//!
//! An Observer is the consumer end of a stream subscription. It receives
//! every published value through `next` and learns about the subject's
//! disposal through `complete`.

// ============================================================================
// Observer Trait
// ============================================================================

/// Observer trait: the consumer of a subject's stream.
pub trait Observer<Item> {
  /// Receive the next value.
  fn next(&mut self, value: Item);

  /// Handle completion of the stream.
  ///
  /// This consumes the observer, as no more values can be delivered after
  /// completion.
  fn complete(self);

  /// Checks if the observer is closed.
  ///
  /// A subscription whose observer reports closed after a `next` detaches
  /// itself from the subject.
  fn is_closed(&self) -> bool;
}

// ============================================================================
// Closure adapters
// ============================================================================

/// Observer that only handles values; completion is ignored.
#[derive(Clone)]
pub struct FnNextObserver<F>(pub F);

impl<F, Item> Observer<Item> for FnNextObserver<F>
where
  F: FnMut(Item),
{
  #[inline]
  fn next(&mut self, value: Item) { (self.0)(value); }

  #[inline]
  fn complete(self) {}

  #[inline]
  fn is_closed(&self) -> bool { false }
}

/// Observer built from a `next` and a `complete` handler.
#[derive(Clone)]
pub struct AllObserver<N, C> {
  next: N,
  complete: C,
}

impl<N, C> AllObserver<N, C> {
  pub fn new(next: N, complete: C) -> Self { Self { next, complete } }
}

impl<N, C, Item> Observer<Item> for AllObserver<N, C>
where
  N: FnMut(Item),
  C: FnOnce(),
{
  #[inline]
  fn next(&mut self, value: Item) { (self.next)(value); }

  #[inline]
  fn complete(self) { (self.complete)(); }

  #[inline]
  fn is_closed(&self) -> bool { false }
}

// ============================================================================
// Tests
// ============================================================================
