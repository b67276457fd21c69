//! A thread-safe, single-assignment deferred value.
//!
//! [`DeferredValue`] wraps a zero-argument factory and runs it on the first [`read`], at most
//! once, no matter how many threads race for the value. Concurrent first readers block until
//! the single factory invocation has finished and then share its outcome.
//!
//! # Failure Policy
//!
//! The outcome of the factory is stored whatever it is. If the factory fails, the reader that
//! triggered it receives the error, and every later read receives a clone of the same error;
//! the factory is never retried. [`DeferredValue::is_produced`] stays `false` in that case.
//!
//! A factory that panics leaves no outcome behind. The panic unwinds through the triggering
//! reader, the factory is gone, and every later read returns [`Error::FactoryUnavailable`].
//!
//! [`read`]: DeferredValue::read

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, OnceLock,
    },
};

use crate::{Error, Result};

type Factory<V> = Box<dyn FnOnce() -> Result<V> + Send>;

/// A value produced on first access by a factory that runs at most once.
///
/// # Examples
///
/// ```rust
/// use lazyproxy::proxy::DeferredValue;
/// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
///
/// let runs = Arc::new(AtomicUsize::new(0));
/// let counter = runs.clone();
/// let value = DeferredValue::new(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
///     Ok(String::from("expensive"))
/// });
///
/// assert!(!value.is_produced());
/// assert_eq!(value.read()?, "expensive");
/// assert_eq!(value.read()?, "expensive");
/// assert_eq!(runs.load(Ordering::SeqCst), 1);
/// # Ok::<(), lazyproxy::Error>(())
/// ```
pub struct DeferredValue<V> {
    /// The factory, until it has been taken by the first reader
    factory: Mutex<Option<Factory<V>>>,
    /// The outcome of the factory
    cell: OnceLock<Result<V>>,
    /// Set once the produced value has been released
    released: AtomicBool,
}

impl<V> DeferredValue<V> {
    /// Create a new deferred value. The factory does not run yet.
    ///
    /// ## Arguments
    /// * `factory` - Produces the value on first access
    pub fn new<F>(factory: F) -> Self
    where
        F: FnOnce() -> Result<V> + Send + 'static,
    {
        DeferredValue {
            factory: Mutex::new(Some(Box::new(factory))),
            cell: OnceLock::new(),
            released: AtomicBool::new(false),
        }
    }

    /// Returns the value, running the factory if this is the first access.
    ///
    /// # Errors
    /// Returns the factory's error, on this and on every later call.
    pub fn read(&self) -> Result<&V> {
        match self.cell.get_or_init(|| self.produce()) {
            Ok(value) => Ok(value),
            Err(error) => Err(error.clone()),
        }
    }

    /// Returns the value if it has been produced, without running the factory
    #[must_use]
    pub fn get(&self) -> Option<&V> {
        self.cell.get().and_then(|outcome| outcome.as_ref().ok())
    }

    /// Returns `true` once the factory has successfully produced the value
    #[must_use]
    pub fn is_produced(&self) -> bool {
        matches!(self.cell.get(), Some(Ok(_)))
    }

    /// Returns `true` if the factory ran and failed
    #[must_use]
    pub fn is_faulted(&self) -> bool {
        matches!(self.cell.get(), Some(Err(_)))
    }

    /// Release the produced value, if there is one.
    ///
    /// `release` is called at most once over the lifetime of the holder, and only if the value
    /// has been produced; a holder whose factory never ran stays untouched and its factory
    /// never runs.
    ///
    /// ## Arguments
    /// * `release` - Called with the produced value
    ///
    /// # Errors
    /// Returns whatever `release` raises.
    pub fn release_if_produced<F>(&self, release: F) -> Result<bool>
    where
        F: FnOnce(&V) -> Result<()>,
    {
        let Some(value) = self.get() else {
            return Ok(false);
        };
        if self.released.swap(true, Ordering::AcqRel) {
            return Ok(false);
        }

        release(value)?;
        Ok(true)
    }

    fn produce(&self) -> Result<V> {
        let factory = self.factory.lock().map_err(|_| Error::LockError)?.take();
        match factory {
            Some(factory) => {
                log::trace!("Running deferred value factory");
                factory()
            }
            None => Err(Error::FactoryUnavailable),
        }
    }
}

impl<V> fmt::Debug for DeferredValue<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredValue")
            .field("produced", &self.is_produced())
            .field("faulted", &self.is_faulted())
            .field("released", &self.released.load(Ordering::Acquire))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Barrier,
        },
        thread,
        time::Duration,
    };

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("factory exploded")]
    struct Exploded;

    #[test]
    fn test_panicking_factory_is_not_rerun() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let value: DeferredValue<u32> = DeferredValue::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            panic!("factory panicked")
        });

        let first =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| value.read().is_ok()));
        assert!(first.is_err());

        assert!(matches!(value.read(), Err(Error::FactoryUnavailable)));
        assert!(!value.is_produced());
        assert!(!value.is_faulted());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_factory_is_deferred() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let value = DeferredValue::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(42)
        });

        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(value.get().is_none());
        assert_eq!(*value.read().unwrap(), 42);
        assert_eq!(*value.read().unwrap(), 42);
        assert_eq!(value.get(), Some(&42));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_first_reads_run_factory_once() {
        const THREADS: usize = 8;

        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let value = Arc::new(DeferredValue::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            Ok(Arc::new(String::from("shared")))
        }));
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let value = value.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    value.read().map(Arc::clone)
                })
            })
            .collect();

        let results: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap().unwrap())
            .collect();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        for result in &results {
            assert!(Arc::ptr_eq(result, &results[0]));
        }
    }

    #[test]
    fn test_failure_is_cached() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let value: DeferredValue<i32> = DeferredValue::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(Error::raise(Exploded))
        });

        let first = value.read().unwrap_err();
        let second = value.read().unwrap_err();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(first.raised().unwrap().ptr_eq(second.raised().unwrap()));
        assert!(first.raised().unwrap().downcast_ref::<Exploded>().is_some());
        assert!(!value.is_produced());
        assert!(value.is_faulted());
    }

    #[test]
    fn test_release_only_if_produced() {
        let releases = AtomicUsize::new(0);
        let release = |_: &i32| {
            releases.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };

        let untouched = DeferredValue::new(|| -> Result<i32> { panic!("must not run") });
        assert!(!untouched.release_if_produced(release).unwrap());
        assert!(!untouched.is_produced());

        let produced = DeferredValue::new(|| Ok(1));
        produced.read().unwrap();
        assert!(produced.release_if_produced(release).unwrap());
        assert!(!produced.release_if_produced(release).unwrap());
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }
}
