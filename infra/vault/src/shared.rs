use parking_lot::Mutex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::engine::ReadOnce;
use crate::error::ReadOnceError;
use crate::types::{Aes, REDACTED, SecretValue, VaultCipher};

/// A [`ReadOnce`] that can be handed between threads.
///
/// `add` and `get` take `&self` and serialize on an internal mutex, so exactly one
/// caller ever receives the secret. Share it through an `Arc`; it is never cloned.
///
/// ```rust
/// use readonce_vault::prelude::*;
/// use std::sync::Arc;
///
/// # fn main() -> Result<(), ReadOnceError> {
/// let token = Arc::new(SharedReadOnce::<String>::with_secret("api-token".to_owned())?);
///
/// let worker = Arc::clone(&token);
/// let released = std::thread::spawn(move || worker.get()).join().unwrap()?;
///
/// assert_eq!(released, "api-token");
/// assert!(token.get().is_err());
/// # Ok(())
/// # }
/// ```
pub struct SharedReadOnce<T, C: VaultCipher = Aes> {
    inner: Mutex<ReadOnce<T, C>>,
}

impl<T: SecretValue, C: VaultCipher> SharedReadOnce<T, C> {
    /// Creates an empty shared container with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::from(ReadOnce::<T, C>::new())
    }

    /// Creates a shared container that already holds `value`.
    ///
    /// # Errors
    /// See [`ReadOnce::add`].
    pub fn with_secret(value: T) -> Result<Self, ReadOnceError> {
        ReadOnce::<T, C>::with_secret(value).map(Self::from)
    }

    /// Seals `value`, replacing any secret stored before.
    ///
    /// # Errors
    /// See [`ReadOnce::add`].
    pub fn add(&self, value: T) -> Result<(), ReadOnceError> {
        self.inner.lock().add(value)
    }

    /// Releases the secret to the first caller; every later call fails.
    ///
    /// # Errors
    /// See [`ReadOnce::get`].
    pub fn get(&self) -> Result<T, ReadOnceError> {
        self.inner.lock().get()
    }

    /// See [`ReadOnce::len`].
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Unwraps the underlying container.
    #[must_use]
    pub fn into_inner(self) -> ReadOnce<T, C> {
        self.inner.into_inner()
    }
}

impl<T, C: VaultCipher> From<ReadOnce<T, C>> for SharedReadOnce<T, C> {
    fn from(container: ReadOnce<T, C>) -> Self {
        Self { inner: Mutex::new(container) }
    }
}

impl<T: SecretValue, C: VaultCipher> Default for SharedReadOnce<T, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C: VaultCipher> fmt::Debug for SharedReadOnce<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T, C: VaultCipher> fmt::Display for SharedReadOnce<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T, C: VaultCipher> Serialize for SharedReadOnce<T, C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.inner.lock().serialize(serializer)
    }
}

impl<'de, T, C: VaultCipher> Deserialize<'de> for SharedReadOnce<T, C> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        ReadOnce::<T, C>::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_exactly_one_thread_receives_the_secret() {
        let secret = Arc::new(SharedReadOnce::<String>::with_secret("db-pass".to_owned()).unwrap());
        let winners = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let secret = Arc::clone(&secret);
                let winners = Arc::clone(&winners);
                thread::spawn(move || match secret.get() {
                    Ok(value) => {
                        assert_eq!(value, "db-pass");
                        winners.fetch_add(1, Ordering::SeqCst);
                    },
                    Err(err) => assert!(matches!(err, ReadOnceError::AlreadyConsumed { .. })),
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(winners.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_add_through_shared_reference() {
        let secret = SharedReadOnce::<Vec<u8>, ChaCha>::new();
        secret.add(vec![1, 2, 3]).unwrap();
        secret.add(vec![4, 5, 6]).unwrap();

        assert_eq!(format!("{secret:?}"), REDACTED);
        assert_eq!(secret.get().unwrap(), vec![4, 5, 6]);
        assert!(secret.add(vec![7]).is_err());
    }

    #[test]
    fn test_into_inner_keeps_state() {
        let secret = SharedReadOnce::<String>::with_secret("kept".to_owned()).unwrap();
        let mut inner = secret.into_inner();

        assert_eq!(inner.get().unwrap(), "kept");
    }
}
