use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex};

struct LockState {
  owner: Option<ThreadId>,
  count: usize,
}

/// A blocking mutual-exclusion lock that the owning thread may acquire
/// multiple times. The lock tracks an acquisition count per owner and is
/// only fully released when the count returns to zero.
pub struct ReentrantLock {
  state: Mutex<LockState>,
  condvar: Condvar,
}

impl ReentrantLock {
  pub fn new() -> Self {
    Self {
      state: Mutex::new(LockState { owner: None, count: 0 }),
      condvar: Condvar::new(),
    }
  }

  /// Blocks the calling thread until the lock is acquired. Re-acquisition by
  /// the thread that already owns the lock succeeds immediately.
  pub fn lock(&self) -> ReentrantLockGuard<'_> {
    let current = thread::current().id();
    let mut state = self.state.lock();
    loop {
      match state.owner {
        None => {
          state.owner = Some(current);
          state.count = 1;
          break;
        }
        Some(owner) if owner == current => {
          state.count += 1;
          break;
        }
        Some(_) => {
          tracing::trace!("ReentrantLock::lock: contended, waiting");
          self.condvar.wait(&mut state);
        }
      }
    }
    ReentrantLockGuard {
      lock: self,
      _not_send: PhantomData,
    }
  }

  /// Non-blocking acquisition. Returns `None` when another thread owns the
  /// lock.
  pub fn try_lock(&self) -> Option<ReentrantLockGuard<'_>> {
    let current = thread::current().id();
    let mut state = self.state.lock();
    match state.owner {
      None => {
        state.owner = Some(current);
        state.count = 1;
      }
      Some(owner) if owner == current => {
        state.count += 1;
      }
      Some(_) => return None,
    }
    Some(ReentrantLockGuard {
      lock: self,
      _not_send: PhantomData,
    })
  }

  pub fn is_owned_by_current_thread(&self) -> bool {
    self.state.lock().owner == Some(thread::current().id())
  }

  pub fn hold_count(&self) -> usize {
    self.state.lock().count
  }

  fn unlock(&self) {
    let mut state = self.state.lock();
    debug_assert_eq!(state.owner, Some(thread::current().id()));
    state.count -= 1;
    if state.count == 0 {
      state.owner = None;
      tracing::trace!("ReentrantLock::unlock: fully released");
      self.condvar.notify_one();
    }
  }
}

impl Default for ReentrantLock {
  fn default() -> Self {
    Self::new()
  }
}

impl Debug for ReentrantLock {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let state = self.state.lock();
    f.debug_struct("ReentrantLock")
      .field("owner", &state.owner)
      .field("count", &state.count)
      .finish()
  }
}

/// Releases one level of ownership when dropped, on every exit path.
/// The guard is `!Send`: ownership is keyed by thread identity, so it must
/// be dropped on the thread that acquired it.
#[derive(Debug)]
pub struct ReentrantLockGuard<'a> {
  lock: &'a ReentrantLock,
  _not_send: PhantomData<*const ()>,
}

impl Drop for ReentrantLockGuard<'_> {
  fn drop(&mut self) {
    self.lock.unlock();
  }
}
