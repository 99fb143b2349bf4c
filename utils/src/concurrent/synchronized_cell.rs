use std::cell::{Ref, RefCell, RefMut};
use std::fmt::{Debug, Formatter};
use std::ops::{Index, IndexMut};
use std::sync::Arc;

use thiserror::Error;

use crate::concurrent::reentrant_lock::{ReentrantLock, ReentrantLockGuard};

/// An error that occurs when a non-blocking access attempt fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynchronizedCellError {
  #[error("Failed to acquire the lock: held by another thread")]
  Contended,
}

struct Inner<T> {
  lock: ReentrantLock,
  value: RefCell<T>,
}

// Safety: `value` is only ever borrowed through a guard constructed while
// `lock` is held, and the lock admits a single owning thread at a time.
unsafe impl<T: Send> Sync for Inner<T> {}

/// A shared, reference-counted wrapper that serializes every access to the
/// value it holds through a per-instance [`ReentrantLock`].
///
/// Cloning a cell yields a second handle to the *same* value and the *same*
/// lock, never a copy of the data; the value and the lock are freed together
/// when the last handle is dropped. No operation exposes an unguarded
/// reference: all access goes through a [`SynchronizedCellGuard`] or a
/// closure run while the guard is live.
pub struct SynchronizedCell<T> {
  inner: Arc<Inner<T>>,
}

impl<T> SynchronizedCell<T> {
  pub fn new(value: T) -> Self {
    Self {
      inner: Arc::new(Inner {
        lock: ReentrantLock::new(),
        value: RefCell::new(value),
      }),
    }
  }

  /// Blocks until the lock is acquired and returns a guard that holds it for
  /// its entire lifetime. Acquisition is re-entrant: a thread that already
  /// holds the lock through another guard does not deadlock.
  pub fn lock(&self) -> SynchronizedCellGuard<'_, T> {
    SynchronizedCellGuard {
      value: &self.inner.value,
      _guard: self.inner.lock.lock(),
    }
  }

  /// Non-blocking variant of [`SynchronizedCell::lock`].
  pub fn try_lock(&self) -> Result<SynchronizedCellGuard<'_, T>, SynchronizedCellError> {
    match self.inner.lock.try_lock() {
      Some(guard) => Ok(SynchronizedCellGuard {
        value: &self.inner.value,
        _guard: guard,
      }),
      None => Err(SynchronizedCellError::Contended),
    }
  }

  /// Acquires the lock and runs `f` with shared access to the value.
  pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
    let guard = self.lock();
    let value = guard.get();
    f(&value)
  }

  /// Acquires the lock and runs `f` with exclusive access to the value.
  pub fn write<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
    let guard = self.lock();
    let mut value = guard.get_mut();
    f(&mut value)
  }

  /// Acquires the lock and runs `f` with shared access to the element at
  /// `key`. The wrapped type declares its indexing contract through
  /// [`Index`].
  pub fn read_index<K, R>(&self, key: K, f: impl FnOnce(&T::Output) -> R) -> R
  where
    T: Index<K>, {
    let guard = self.lock();
    let value = guard.index(key);
    f(&value)
  }

  /// Acquires the lock and runs `f` with exclusive access to the element at
  /// `key`.
  pub fn write_index<K, R>(&self, key: K, f: impl FnOnce(&mut T::Output) -> R) -> R
  where
    T: IndexMut<K>, {
    let guard = self.lock();
    let mut value = guard.index_mut(key);
    f(&mut value)
  }

  /// Returns a copy of the value as of the moment of the call, taken under
  /// the lock. A consistent snapshot, not a live view.
  pub fn to_value(&self) -> T
  where
    T: Clone, {
    self.read(|value| value.clone())
  }
}

impl<T> Clone for SynchronizedCell<T> {
  fn clone(&self) -> Self {
    Self {
      inner: self.inner.clone(),
    }
  }
}

impl<T: Default> Default for SynchronizedCell<T> {
  fn default() -> Self {
    Self::new(T::default())
  }
}

impl<T> From<T> for SynchronizedCell<T> {
  fn from(value: T) -> Self {
    Self::new(value)
  }
}

impl<T> Eq for SynchronizedCell<T> {}

impl<T> PartialEq for SynchronizedCell<T> {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }
}

impl<T> Debug for SynchronizedCell<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SynchronizedCell").field("lock", &self.inner.lock).finish()
  }
}

/// Holds the cell's lock for its entire lifetime and releases it exactly
/// once when dropped, on every exit path including unwinding.
///
/// Borrow-level aliasing within the owning thread is policed by the inner
/// `RefCell`: nested shared borrows are fine, while taking a mutable borrow
/// when any other borrow is still live panics instead of producing aliased
/// mutable references.
pub struct SynchronizedCellGuard<'a, T> {
  value: &'a RefCell<T>,
  _guard: ReentrantLockGuard<'a>,
}

impl<'a, T> SynchronizedCellGuard<'a, T> {
  pub fn get(&self) -> Ref<'_, T> {
    self.value.borrow()
  }

  pub fn get_mut(&self) -> RefMut<'_, T> {
    self.value.borrow_mut()
  }

  /// Shared access to the element at `key`, forwarded to the wrapped value's
  /// own [`Index`] implementation.
  pub fn index<K>(&self, key: K) -> Ref<'_, T::Output>
  where
    T: Index<K>, {
    Ref::map(self.value.borrow(), |value| &value[key])
  }

  /// Exclusive access to the element at `key`.
  pub fn index_mut<K>(&self, key: K) -> RefMut<'_, T::Output>
  where
    T: IndexMut<K>, {
    RefMut::map(self.value.borrow_mut(), |value| &mut value[key])
  }
}

impl<'a, T: Debug> Debug for SynchronizedCellGuard<'a, T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SynchronizedCellGuard").field("value", &self.value).finish()
  }
}
