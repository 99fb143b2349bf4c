mod reentrant_lock;
mod reentrant_lock_test;
mod synchronized_cell;

pub use self::{reentrant_lock::*, synchronized_cell::*};
