//! Argument-keyed memoization for sync and async functions.
//!
//! Results are cached under the compact JSON encoding of the argument, so two
//! arguments with the same encoding share one entry. Tuples memoize
//! multi-argument functions. Caches live as long as the wrapper; in a Lambda
//! that is usually the warm container.

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::debug;

fn cache_key<A: Serialize>(arg: &A) -> Option<String> {
    match serde_json::to_string(arg) {
        Ok(key) => Some(key),
        Err(e) => {
            debug!(error = %e, "argument is not serializable; skipping memoization");
            None
        }
    }
}

fn lock<R>(cache: &Mutex<HashMap<String, R>>) -> MutexGuard<'_, HashMap<String, R>> {
    // A panicking factory never runs while the lock is held.
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A memoized synchronous function. See [`memoize`].
pub struct Memoized<A, R, F> {
    factory: F,
    cache: Mutex<HashMap<String, R>>,
    _arg: PhantomData<fn(A)>,
}

/// Wrap `factory` so repeated calls with an equal argument reuse the first
/// result.
///
/// # Example
///
/// ```
/// use apiforge_lambda_shared::memoize;
///
/// let add = memoize(|(a, b): (i32, i32)| a + b);
/// assert_eq!(add.call((2, 3)), 5);
/// assert_eq!(add.call((2, 3)), 5);
/// assert_eq!(add.len(), 1);
/// ```
pub fn memoize<A, R, F>(factory: F) -> Memoized<A, R, F>
where
    A: Serialize,
    R: Clone,
    F: Fn(A) -> R,
{
    Memoized {
        factory,
        cache: Mutex::new(HashMap::new()),
        _arg: PhantomData,
    }
}

impl<A, R, F> Memoized<A, R, F>
where
    A: Serialize,
    R: Clone,
    F: Fn(A) -> R,
{
    pub fn call(&self, arg: A) -> R {
        let Some(key) = cache_key(&arg) else {
            return (self.factory)(arg);
        };

        if let Some(hit) = lock(&self.cache).get(&key) {
            return hit.clone();
        }

        // The factory runs unlocked so it may call back into this wrapper.
        let value = (self.factory)(arg);
        lock(&self.cache).entry(key).or_insert(value).clone()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        lock(&self.cache).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        lock(&self.cache).clear();
    }
}

/// A memoized asynchronous function. See [`memoize_async`].
pub struct MemoizedAsync<A, R, F> {
    factory: F,
    cache: Mutex<HashMap<String, R>>,
    _arg: PhantomData<fn(A)>,
}

/// Async counterpart of [`memoize`].
///
/// The cache lock is never held across the factory's await point, so
/// concurrent first calls with the same argument may each run the factory;
/// the first result to finish is kept.
pub fn memoize_async<A, R, F, Fut>(factory: F) -> MemoizedAsync<A, R, F>
where
    A: Serialize,
    R: Clone,
    F: Fn(A) -> Fut,
    Fut: Future<Output = R>,
{
    MemoizedAsync {
        factory,
        cache: Mutex::new(HashMap::new()),
        _arg: PhantomData,
    }
}

impl<A, R, F, Fut> MemoizedAsync<A, R, F>
where
    A: Serialize,
    R: Clone,
    F: Fn(A) -> Fut,
    Fut: Future<Output = R>,
{
    pub async fn call(&self, arg: A) -> R {
        let Some(key) = cache_key(&arg) else {
            return (self.factory)(arg).await;
        };

        let cached = lock(&self.cache).get(&key).cloned();
        if let Some(hit) = cached {
            return hit;
        }

        let value = (self.factory)(arg).await;
        lock(&self.cache).entry(key).or_insert(value).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.cache).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        lock(&self.cache).clear();
    }
}
