//! Per-object locking for state that user callbacks run against
//!
//! Handles and logger filter chains each sit behind their own lock, so a
//! dispatch holds nothing registry-wide while targets, filters and tokens run.

use super::error::{LoggerError, Result};
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

/// Shared mutable value with one user at a time.
///
/// Other threads wait for their turn. A nested [`Exclusive::with`] on the
/// thread that already holds the value fails with
/// [`LoggerError::InvalidLogCall`] instead of blocking forever.
pub(crate) struct Exclusive<T> {
    cell: Arc<ReentrantMutex<RefCell<T>>>,
}

impl<T> Exclusive<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            cell: Arc::new(ReentrantMutex::new(RefCell::new(value))),
        }
    }

    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        let guard = self.cell.lock();
        let mut value = guard
            .try_borrow_mut()
            .map_err(|_| LoggerError::invalid_call("re-entered from one of its own callbacks"))?;
        Ok(f(&mut *value))
    }
}

impl<T> Clone for Exclusive<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T> fmt::Debug for Exclusive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Exclusive")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_clones_share_the_value() {
        let counter = Exclusive::new(0);
        let other = counter.clone();
        other.with(|n| *n += 2).unwrap();
        assert_eq!(counter.with(|n| *n).unwrap(), 2);
    }

    #[test]
    fn test_nested_use_fails_instead_of_blocking() {
        let value = Exclusive::new(Vec::<u32>::new());
        let nested = value.clone();
        let inner = value
            .with(|outer| {
                outer.push(1);
                nested.with(|v| v.push(2))
            })
            .unwrap();
        assert!(matches!(inner, Err(LoggerError::InvalidLogCall(_))));
        assert_eq!(value.with(|v| v.clone()).unwrap(), vec![1]);
    }

    #[test]
    fn test_threads_take_turns() {
        let total = Exclusive::new(0u64);
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let total = total.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        total.with(|n| *n += 1).unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(total.with(|n| *n).unwrap(), 4000);
    }
}
