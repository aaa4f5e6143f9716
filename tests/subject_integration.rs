//! Integration tests for event-subject
//!
//! Covers the subject used from several threads, stream composition through
//! `futures` combinators and the typical ways application code wires a
//! subject up.

use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc, Mutex,
};
#[cfg(not(target_arch = "wasm32"))]
use std::{sync::Barrier, thread};

use event_subject::prelude::*;

fn counting_callback<T>() -> (Callback<T>, Arc<AtomicUsize>) {
  let hits = Arc::new(AtomicUsize::new(0));
  let c_hits = hits.clone();
  let cb = Callback::new(move |_| {
    c_hits.fetch_add(1, Ordering::SeqCst);
  });
  (cb, hits)
}

// ============================================================================
// Application wiring
// ============================================================================

/// A component that only knows the stream face of a subject.
struct Listener {
  events: SubjectObservable<()>,
  count: Arc<AtomicUsize>,
}

impl Listener {
  fn new(events: SubjectObservable<()>) -> Self {
    Self { events, count: Arc::new(AtomicUsize::new(0)) }
  }

  fn start_listen(&self) -> Result<SubjectSubscription, DisposedError> {
    let count = self.count.clone();
    self.events.clone().subscribe(move |_| {
      count.fetch_add(1, Ordering::SeqCst);
    })
  }

  fn event_count(&self) -> usize { self.count.load(Ordering::SeqCst) }
}

#[event_subject_macro::test]
fn component_listens_through_the_observable() {
  let subject = EventSubject::<()>::new();
  let listener = Listener::new(subject.observe());

  listener.start_listen().unwrap();
  subject.publish(()).unwrap();
  assert_eq!(listener.event_count(), 1);

  subject.dispose();
  let err = listener.start_listen().unwrap_err();
  assert!(err.to_string().contains("EventSubject<()>"));
}

#[event_subject_macro::test]
fn publish_handed_out_as_a_plain_function() {
  let subject = EventSubject::<()>::new();
  let fire = {
    let subject = subject.clone();
    move || subject.publish(())
  };

  let called = Arc::new(AtomicUsize::new(0));
  let c_called = called.clone();
  let subscription = subject
    .observe()
    .subscribe(move |_| {
      c_called.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();

  fire().unwrap();
  assert_eq!(called.load(Ordering::SeqCst), 1);

  subscription.unsubscribe();
  fire().unwrap();
  assert_eq!(called.load(Ordering::SeqCst), 1);

  subject.dispose();
  assert!(fire().unwrap_err().type_name().contains("EventSubject<()>"));
}

#[event_subject_macro::test]
fn handler_style_registration() {
  let subject = EventSubject::<i32>::new();
  let (cb, hits) = counting_callback();

  subject.subscribe(&cb).unwrap();
  subject.publish(1).unwrap();
  subject.unsubscribe(&cb);
  assert_eq!(hits.load(Ordering::SeqCst), 1);

  subject.publish(2).unwrap();
  assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[event_subject_macro::test]
fn create_and_observe_pairs_both_faces() {
  let (subject, observable) = EventSubject::<i32>::create_and_observe();
  let seen = Arc::new(Mutex::new(vec![]));
  let c_seen = seen.clone();
  observable
    .subscribe(move |v| c_seen.lock().unwrap().push(v))
    .unwrap();

  subject.publish(3).unwrap();
  subject.publish(4).unwrap();
  assert_eq!(*seen.lock().unwrap(), vec![3, 4]);
}

#[event_subject_macro::test]
fn callbacks_and_streams_share_one_chain() {
  let subject = EventSubject::<i32>::new();
  let log = Arc::new(Mutex::new(vec![]));

  let c_log = log.clone();
  let cb = Callback::new(move |v| c_log.lock().unwrap().push(format!("cb {}", v)));
  subject.subscribe(&cb).unwrap();

  let (s_log, d_log) = (log.clone(), log.clone());
  subject
    .observe()
    .subscribe_all(
      move |v| s_log.lock().unwrap().push(format!("stream {}", v)),
      move || d_log.lock().unwrap().push("stream done".to_string()),
    )
    .unwrap();
  assert_eq!(subject.subscriber_count(), 2);

  subject.publish(1).unwrap();
  subject.dispose();

  assert_eq!(*log.lock().unwrap(), vec!["cb 1", "stream 1", "stream done"]);
  assert_eq!(subject.subscriber_count(), 0);
}

#[event_subject_macro::test]
fn pattern_subject_end_to_end() {
  let subject = PatternSubject::<&'static str, u32>::new();
  let clicks = Arc::new(Mutex::new(vec![]));

  let c_clicks = clicks.clone();
  let handler = PatternHandler::new(move |sender: &'static str, args: u32| {
    c_clicks.lock().unwrap().push((sender, args))
  });
  subject.add_handler(&handler).unwrap();

  let patterns = Arc::new(Mutex::new(vec![]));
  let c_patterns = patterns.clone();
  subject
    .observe()
    .subscribe(move |p: EventPattern<&'static str, u32>| c_patterns.lock().unwrap().push(p.args))
    .unwrap();

  subject.publish_pattern("ok-button", 1).unwrap();
  subject.remove_handler(&handler);
  subject.publish_pattern("ok-button", 2).unwrap();
  subject.dispose();

  assert_eq!(*clicks.lock().unwrap(), vec![("ok-button", 1)]);
  assert_eq!(*patterns.lock().unwrap(), vec![1, 2]);
  assert!(subject.add_handler(&handler).is_err());
}

// ============================================================================
// Stream composition
// ============================================================================

#[cfg(feature = "stream")]
mod stream_composition {
  use futures::{executor::block_on, stream, StreamExt};

  use super::*;

  #[event_subject_macro::test]
  fn stream_combinators_compose() {
    let subject = EventSubject::<i32>::new();
    let stream = subject.observe().into_stream().unwrap();

    for v in 1..=10 {
      subject.publish(v).unwrap();
    }
    subject.dispose();

    let values: Vec<_> = block_on(
      stream
        .filter(|v| futures::future::ready(v % 2 == 0))
        .map(|v| v * v)
        .collect(),
    );
    assert_eq!(values, vec![4, 16, 36, 64, 100]);
  }

  #[event_subject_macro::test]
  fn take_detaches_once_the_stream_is_dropped() {
    let subject = EventSubject::<i32>::new();
    let stream = subject.observe().into_stream().unwrap();

    subject.publish(1).unwrap();
    subject.publish(2).unwrap();
    let first: Vec<_> = block_on(stream.take(1).collect());

    assert_eq!(first, vec![1]);
    assert_eq!(subject.subscriber_count(), 0);
    assert!(!subject.is_disposed());
  }

  #[event_subject_macro::test]
  fn take_while_stops_at_the_first_rejected_value() {
    let subject = EventSubject::<i32>::new();
    let stream = subject.observe().into_stream().unwrap();

    for v in [1, 1, 2, 1] {
      subject.publish(v).unwrap();
    }
    let taken: Vec<_> = block_on(stream.take_while(|v| futures::future::ready(*v < 2)).collect());
    assert_eq!(taken, vec![1, 1]);
  }

  #[event_subject_macro::test]
  fn merged_streams_end_when_both_subjects_are_disposed() {
    let left = EventSubject::<&'static str>::new();
    let right = EventSubject::<&'static str>::new();
    let merged = stream::select(
      left.observe().into_stream().unwrap(),
      right.observe().into_stream().unwrap(),
    );

    left.publish("l1").unwrap();
    right.publish("r1").unwrap();
    left.dispose();
    right.publish("r2").unwrap();
    right.dispose();

    let mut values: Vec<_> = block_on(merged.collect());
    values.sort_unstable();
    assert_eq!(values, vec!["l1", "r1", "r2"]);
  }

  #[event_subject_macro::test]
  fn zipped_streams_pair_values() {
    let numbers = EventSubject::<i32>::new();
    let names = EventSubject::<&'static str>::new();
    let zipped = numbers
      .observe()
      .into_stream()
      .unwrap()
      .zip(names.observe().into_stream().unwrap());

    numbers.publish(1).unwrap();
    numbers.publish(2).unwrap();
    names.publish("one").unwrap();
    names.publish("two").unwrap();
    numbers.dispose();
    names.dispose();

    let pairs: Vec<_> = block_on(zipped.collect());
    assert_eq!(pairs, vec![(1, "one"), (2, "two")]);
  }

  #[event_subject_macro::test(shared)]
  async fn stream_consumed_on_a_multi_thread_runtime() {
    let subject = EventSubject::<usize>::new();
    let stream = subject.observe().into_stream().unwrap();

    let producers: Vec<_> = (0..4)
      .map(|i| {
        let subject = subject.clone();
        tokio::spawn(async move {
          for v in 0..25 {
            subject.publish(i * 100 + v).unwrap();
          }
        })
      })
      .collect();
    for producer in producers {
      producer.await.unwrap();
    }
    subject.dispose();

    let values: Vec<_> = stream.collect().await;
    assert_eq!(values.len(), 100);
  }
}

// ============================================================================
// Threading
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
#[event_subject_macro::test]
fn concurrent_subscribers_see_their_own_publishes() {
  let subject = EventSubject::<usize>::new();
  let barrier = Arc::new(Barrier::new(4));

  let handles: Vec<_> = (0..4)
    .map(|_| {
      let (subject, barrier) = (subject.clone(), barrier.clone());
      thread::spawn(move || {
        let (cb, hits) = counting_callback();
        barrier.wait();
        subject.subscribe(&cb).unwrap();
        for v in 0..100 {
          subject.publish(v).unwrap();
        }
        hits.load(Ordering::SeqCst)
      })
    })
    .collect();

  for handle in handles {
    assert!(handle.join().unwrap() >= 100);
  }
  assert_eq!(subject.subscriber_count(), 4);
}

#[cfg(not(target_arch = "wasm32"))]
#[event_subject_macro::test]
fn concurrent_dispose_completes_every_subscription_once() {
  let subject = EventSubject::<i32>::new();
  let completions = Arc::new(AtomicUsize::new(0));
  for _ in 0..10 {
    let completions = completions.clone();
    subject
      .observe()
      .subscribe_all(
        |_| {},
        move || {
          completions.fetch_add(1, Ordering::SeqCst);
        },
      )
      .unwrap();
  }

  let barrier = Arc::new(Barrier::new(8));
  let handles: Vec<_> = (0..8)
    .map(|_| {
      let (subject, barrier) = (subject.clone(), barrier.clone());
      thread::spawn(move || {
        barrier.wait();
        subject.dispose();
      })
    })
    .collect();
  for handle in handles {
    handle.join().unwrap();
  }

  assert_eq!(completions.load(Ordering::SeqCst), 10);
  assert!(subject.is_disposed());
  assert_eq!(subject.subscriber_count(), 0);
}

#[cfg(not(target_arch = "wasm32"))]
#[event_subject_macro::test]
fn subscriptions_racing_dispose_complete_exactly_once() {
  let subject = EventSubject::<i32>::new();
  let completions = Arc::new(AtomicUsize::new(0));
  let barrier = Arc::new(Barrier::new(5));

  let subscribers: Vec<_> = (0..4)
    .map(|_| {
      let (subject, barrier, completions) = (subject.clone(), barrier.clone(), completions.clone());
      thread::spawn(move || {
        barrier.wait();
        let mut accepted = 0;
        for _ in 0..200 {
          let completions = completions.clone();
          let result = subject.observe().subscribe_all(
            |_| {},
            move || {
              completions.fetch_add(1, Ordering::SeqCst);
            },
          );
          if result.is_ok() {
            accepted += 1;
          }
        }
        accepted
      })
    })
    .collect();

  barrier.wait();
  subject.dispose();

  let accepted: usize = subscribers.into_iter().map(|h| h.join().unwrap()).sum();
  assert_eq!(completions.load(Ordering::SeqCst), accepted);
  assert_eq!(subject.subscriber_count(), 0);
}

#[cfg(not(target_arch = "wasm32"))]
#[event_subject_macro::test]
fn publishers_racing_dispose_stop_with_an_error() {
  let subject = EventSubject::<i32>::new();
  let (cb, _) = counting_callback();
  subject.subscribe(&cb).unwrap();

  let publishers: Vec<_> = (0..4)
    .map(|_| {
      let subject = subject.clone();
      thread::spawn(move || {
        let mut sent = 0;
        while subject.publish(sent).is_ok() {
          sent += 1;
        }
        subject.publish(0).unwrap_err()
      })
    })
    .collect();

  thread::sleep(std::time::Duration::from_millis(5));
  subject.dispose();

  for publisher in publishers {
    let err = publisher.join().unwrap();
    assert_eq!(err.as_label(), "subject_disposed");
  }
}
