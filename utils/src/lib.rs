pub mod concurrent;

pub use concurrent::{
  ReentrantLock, ReentrantLockGuard, SynchronizedCell, SynchronizedCellError, SynchronizedCellGuard,
};
