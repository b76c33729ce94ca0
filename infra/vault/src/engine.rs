use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use tracing::{debug, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::builder::ReadOnceBuilder;
use crate::error::{ReadOnceError, ReadOnceErrorExt};
use crate::seal::{self, SecretKey};
use crate::types::{Aes, KEY_LEN, REDACTED, SecretValue, Validator, VaultCipher};

/// The ephemeral key together with the only ciphertext it ever encrypted.
///
/// Both are wiped when the slot is overwritten, consumed or dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
struct Sealed {
    key: [u8; KEY_LEN],
    blob: Vec<u8>,
}

impl Sealed {
    fn new(key: &SecretKey, blob: Vec<u8>) -> Self {
        Self { key: **key, blob }
    }
}

enum Slot {
    Empty,
    Loaded(Sealed),
    Consumed,
}

pub(crate) struct Settings<T> {
    pub(crate) label: Cow<'static, str>,
    pub(crate) compression: bool,
    pub(crate) validator: Option<Validator<T>>,
}

/// A container that releases its secret exactly once.
///
/// `ReadOnce` moves through three states:
///
/// ```text
/// EMPTY --add--> LOADED --get--> CONSUMED
///                  |  ^
///                  +--+ add (overwrite, key rotates)
/// ```
///
/// * Every [`add`](Self::add) encodes the value with `postcard`, wipes the caller's copy,
///   draws a fresh 256-bit key and seals the bytes with the AEAD cipher `C`. The previous
///   key and ciphertext are zeroized, so an overwritten secret is gone for good.
/// * [`get`](Self::get) moves the container into `CONSUMED` before decrypting. Whatever
///   the outcome, the container is inert afterwards.
/// * `CONSUMED` is terminal: every later `add` or `get` fails with
///   [`ReadOnceError::AlreadyConsumed`].
///
/// The container never shows its internals: `Debug` and `Display` render
/// [`REDACTED`](crate::REDACTED), `Serialize` fails with `SerializationRejected`, and
/// `Deserialize` fails with `DirectStateMutationRejected`. It implements neither `Clone`
/// nor `PartialEq`, and it has no public fields; wrappers can only compose it.
///
/// ### Generic Parameters
/// * `T`: The secret type, any [`SecretValue`].
/// * `C`: The cipher. Defaults to [`Aes`] (AES-256-GCM).
///
/// ### Example
/// ```rust
/// use readonce_vault::prelude::*;
///
/// # fn main() -> Result<(), ReadOnceError> {
/// let mut secret = ReadOnce::<String>::new();
/// secret.add("awesome_password".to_owned())?;
///
/// assert_eq!(format!("{secret:?}"), "ReadOnce[secrets=*****]");
/// assert_eq!(secret.get()?, "awesome_password");
/// assert!(matches!(secret.get(), Err(ReadOnceError::AlreadyConsumed { .. })));
/// # Ok(())
/// # }
/// ```
pub struct ReadOnce<T, C = Aes>
where
    C: VaultCipher,
{
    slot: Slot,
    settings: Settings<T>,
    _cipher: PhantomData<fn() -> C>,
}

impl<T, C> ReadOnce<T, C>
where
    T: SecretValue,
    C: VaultCipher,
{
    /// Creates an empty container with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Returns a new [`ReadOnceBuilder`] to configure the container.
    #[must_use]
    pub fn builder() -> ReadOnceBuilder<T, C> {
        ReadOnceBuilder::new()
    }

    /// Creates a container that already holds `value`.
    ///
    /// # Errors
    /// See [`ReadOnce::add`].
    pub fn with_secret(value: T) -> Result<Self, ReadOnceError> {
        let mut container = Self::new();
        container.add(value)?;
        Ok(container)
    }

    pub(crate) const fn from_settings(settings: Settings<T>) -> Self {
        Self { slot: Slot::Empty, settings, _cipher: PhantomData }
    }

    /// Seals `value`, replacing any secret stored before.
    ///
    /// The value is consumed and wiped; only ciphertext under a freshly generated key
    /// remains in the container.
    ///
    /// # Errors
    /// * [`ReadOnceError::AlreadyConsumed`] If the secret was already released.
    /// * [`ReadOnceError::InvalidSecret`] If the configured validator rejects the value.
    /// * [`ReadOnceError::Serialization`] If the value cannot be encoded.
    /// * [`ReadOnceError::Encryption`] If the RNG or the AEAD cipher fails.
    pub fn add(&mut self, mut value: T) -> Result<(), ReadOnceError> {
        if matches!(self.slot, Slot::Consumed) {
            value.zeroize();
            return Err(self.reject(ReadOnceError::AlreadyConsumed { context: Some("add".into()) }));
        }

        if let Some(validate) = self.settings.validator
            && let Err(message) = validate(&value)
        {
            value.zeroize();
            return Err(self.reject(ReadOnceError::InvalidSecret {
                message,
                context: Some(self.settings.label.clone()),
            }));
        }

        let encoded = seal::encode(&value);
        value.zeroize();
        let encoded = encoded?;

        let key = seal::generate_key()?;
        let blob = seal::seal::<C>(
            &key,
            &encoded,
            self.settings.label.as_bytes(),
            self.settings.compression,
        )?;

        let rotated = matches!(self.slot, Slot::Loaded(_));
        self.slot = Slot::Loaded(Sealed::new(&key, blob));

        debug!(label = %self.settings.label, rotated, "Secret sealed");
        Ok(())
    }

    /// Releases the secret. Succeeds at most once.
    ///
    /// # Errors
    /// * [`ReadOnceError::AlreadyConsumed`] If the secret was already released or never added.
    /// * [`ReadOnceError::Decryption`] or [`ReadOnceError::InvalidPayload`] If the sealed
    ///   bytes are corrupt. The container stays consumed.
    /// * [`ReadOnceError::Serialization`] If the decrypted bytes cannot be decoded.
    pub fn get(&mut self) -> Result<T, ReadOnceError> {
        let sealed = match std::mem::replace(&mut self.slot, Slot::Consumed) {
            Slot::Loaded(sealed) => sealed,
            Slot::Empty => {
                self.slot = Slot::Empty;
                return Err(
                    self.reject(ReadOnceError::AlreadyConsumed { context: Some("empty".into()) })
                );
            },
            Slot::Consumed => {
                return Err(
                    self.reject(ReadOnceError::AlreadyConsumed { context: Some("get".into()) })
                );
            },
        };

        let plain = seal::unseal::<C>(&sealed.key, &sealed.blob, self.settings.label.as_bytes())
            .map_err(|e| self.reject(e))?;
        drop(sealed);

        let value = postcard::from_bytes::<T>(&plain).context("Postcard decoding failed")?;

        debug!(label = %self.settings.label, "Secret released");
        Ok(value)
    }

    /// Releases the secret and drops the container.
    ///
    /// # Errors
    /// See [`ReadOnce::get`].
    pub fn into_secret(mut self) -> Result<T, ReadOnceError> {
        self.get()
    }
}

impl<T, C: VaultCipher> ReadOnce<T, C> {
    /// The associated data this container binds its ciphertext to.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.settings.label
    }

    /// Number of secrets waiting to be released: `1` when loaded, `0` otherwise.
    #[must_use]
    pub const fn len(&self) -> usize {
        match self.slot {
            Slot::Loaded(_) => 1,
            Slot::Empty | Slot::Consumed => 0,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn reject(&self, err: ReadOnceError) -> ReadOnceError {
        warn!(label = %self.settings.label, kind = err.kind(), "Rejected access to sensitive value");
        err
    }
}

impl<T: SecretValue, C: VaultCipher> Default for ReadOnce<T, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C: VaultCipher> fmt::Debug for ReadOnce<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T, C: VaultCipher> fmt::Display for ReadOnce<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T, C: VaultCipher> Serialize for ReadOnce<T, C> {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        let err = self.reject(ReadOnceError::SerializationRejected { context: None });
        Err(S::Error::custom(err))
    }
}

impl<'de, T, C: VaultCipher> Deserialize<'de> for ReadOnce<T, C> {
    fn deserialize<D: Deserializer<'de>>(_deserializer: D) -> Result<Self, D::Error> {
        let err = ReadOnceError::DirectStateMutationRejected { context: Some("deserialize".into()) };
        warn!(kind = err.kind(), "Rejected attempt to rebuild a sensitive value");
        Err(D::Error::custom(err))
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn test_add_then_get() {
        let mut secret = ReadOnce::<String>::new();
        secret.add("awesome_password".to_owned()).unwrap();

        assert_eq!(secret.get().unwrap(), "awesome_password");
    }

    #[test]
    fn test_second_get_fails() {
        let mut secret = ReadOnce::<String>::with_secret("awesome_password".to_owned()).unwrap();
        secret.get().unwrap();

        assert!(matches!(secret.get(), Err(ReadOnceError::AlreadyConsumed { .. })));
    }

    #[test]
    fn test_get_on_empty_fails_and_stays_empty() {
        let mut secret = ReadOnce::<String, ChaCha>::new();

        assert!(matches!(secret.get(), Err(ReadOnceError::AlreadyConsumed { .. })));

        secret.add("late".to_owned()).unwrap();
        assert_eq!(secret.get().unwrap(), "late");
    }

    #[test]
    fn test_last_add_wins() {
        let mut secret = ReadOnce::<String>::new();
        secret.add("first".to_owned()).unwrap();
        secret.add("second".to_owned()).unwrap();

        assert_eq!(secret.get().unwrap(), "second");
    }

    #[test]
    fn test_add_after_consume_fails() {
        let mut secret = ReadOnce::<String>::with_secret("awesome_pass".to_owned()).unwrap();
        secret.get().unwrap();

        assert!(matches!(
            secret.add("new_secret".to_owned()),
            Err(ReadOnceError::AlreadyConsumed { .. })
        ));
        assert!(secret.get().is_err());
    }

    #[test]
    fn test_corrupt_ciphertext_consumes() {
        let mut secret = ReadOnce::<String>::with_secret("awesome_pass".to_owned()).unwrap();
        if let super::Slot::Loaded(sealed) = &mut secret.slot {
            let last = sealed.blob.len() - 1;
            sealed.blob[last] ^= 0x01;
        }

        assert!(matches!(secret.get(), Err(ReadOnceError::Decryption { .. })));
        assert!(matches!(secret.get(), Err(ReadOnceError::AlreadyConsumed { .. })));
    }

    #[test]
    fn test_overwrite_rotates_key() {
        let mut secret = ReadOnce::<String>::with_secret("first".to_owned()).unwrap();
        let super::Slot::Loaded(first) = &secret.slot else { panic!("secret should be loaded") };
        let first_key = first.key;

        secret.add("second".to_owned()).unwrap();
        let super::Slot::Loaded(second) = &secret.slot else { panic!("secret should be loaded") };

        assert_ne!(first_key, second.key);
    }

    #[test]
    fn test_representation_is_redacted() {
        let mut secret = ReadOnce::<String>::with_secret("awesome_pass".to_owned()).unwrap();
        assert_eq!(format!("{secret:?}"), REDACTED);
        assert_eq!(secret.to_string(), REDACTED);

        secret.get().unwrap();
        assert_eq!(format!("{secret:#?}"), REDACTED);
    }

    #[test]
    fn test_len_tracks_pending_secret() {
        let mut secret = ReadOnce::<String>::new();
        assert!(secret.is_empty());

        secret.add("new_password".to_owned()).unwrap();
        secret.add("newer_password".to_owned()).unwrap();
        assert_eq!(secret.len(), 1);

        assert_eq!(secret.get().unwrap(), "newer_password");
        assert_eq!(secret.len(), 0);
    }

    #[test]
    fn test_numbers_keep_their_shape() {
        let mut port = ReadOnce::<u16>::with_secret(3306).unwrap();
        assert_eq!(port.get().unwrap(), 3306);
    }
}
