#[cfg(test)]
mod tests {
  use std::sync::mpsc;
  use std::sync::Arc;
  use std::thread;
  use std::time::Duration;

  use static_assertions::{assert_impl_all, assert_not_impl_any};

  use crate::concurrent::{ReentrantLock, ReentrantLockGuard};

  assert_impl_all!(ReentrantLock: Send, Sync);
  assert_not_impl_any!(ReentrantLockGuard<'static>: Send);

  #[test]
  fn test_acquisition_count_tracks_nesting() {
    let lock = ReentrantLock::new();
    assert_eq!(lock.hold_count(), 0);
    assert!(!lock.is_owned_by_current_thread());

    let outer = lock.lock();
    assert!(lock.is_owned_by_current_thread());
    assert_eq!(lock.hold_count(), 1);
    {
      let _inner = lock.lock();
      assert_eq!(lock.hold_count(), 2);
    }
    assert_eq!(lock.hold_count(), 1);

    drop(outer);
    assert_eq!(lock.hold_count(), 0);
    assert!(!lock.is_owned_by_current_thread());
  }

  #[test]
  fn test_try_lock_fails_across_threads() {
    let lock = Arc::new(ReentrantLock::new());
    let guard = lock.lock();

    let contender = lock.clone();
    let held = thread::spawn(move || contender.try_lock().is_none()).join().unwrap();
    assert!(held);

    drop(guard);
    let contender = lock.clone();
    let freed = thread::spawn(move || contender.try_lock().is_some()).join().unwrap();
    assert!(freed);
  }

  #[test]
  fn test_try_lock_is_reentrant_for_owner() {
    let lock = ReentrantLock::new();
    let _outer = lock.lock();
    let inner = lock.try_lock();
    assert!(inner.is_some());
    assert_eq!(lock.hold_count(), 2);
  }

  #[test]
  fn test_release_wakes_a_waiter() {
    let lock = Arc::new(ReentrantLock::new());
    let guard = lock.lock();

    let (started_tx, started_rx) = mpsc::channel();
    let waiter = lock.clone();
    let handle = thread::spawn(move || {
      started_tx.send(()).unwrap();
      let _guard = waiter.lock();
    });

    started_rx.recv().unwrap();
    // give the waiter time to block on the lock before releasing it
    thread::sleep(Duration::from_millis(50));
    drop(guard);
    handle.join().unwrap();
    assert_eq!(lock.hold_count(), 0);
  }
}
