use crate::engine::{ReadOnce, Settings};
use crate::types::{Aes, ReadOnceOptions, SecretValue, Validator, VaultCipher};
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

/// A builder for configuring a [`ReadOnce`] container.
///
/// Nothing secret passes through the builder; key material is generated by the
/// container itself on every `add`.
pub struct ReadOnceBuilder<T, C: VaultCipher = Aes> {
    label: Option<Cow<'static, str>>,
    compression: bool,
    validator: Option<Validator<T>>,
    _cipher: PhantomData<fn() -> C>,
}

impl<T: SecretValue, C: VaultCipher> Default for ReadOnceBuilder<T, C> {
    fn default() -> Self {
        Self { label: None, compression: false, validator: None, _cipher: PhantomData }
    }
}

impl<T: SecretValue, C: VaultCipher> ReadOnceBuilder<T, C> {
    /// Creates a new builder with compression disabled and no validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the ciphertext to `label` (AEAD associated data).
    ///
    /// Defaults to the type name of `T`.
    #[must_use]
    pub fn label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Toggles LZ4 compression of the encoded value before encryption.
    ///
    /// # Security / Threat Model
    /// Compression before encryption can leak information through the ciphertext
    /// length. The container never exposes its ciphertext, so this only matters if
    /// memory is observable. Leave it off for short secrets.
    #[must_use]
    pub const fn compression(mut self, enabled: bool) -> Self {
        self.compression = enabled;
        self
    }

    /// Runs `validator` on every value before it is sealed.
    ///
    /// A rejected value is wiped and [`ReadOnceError::InvalidSecret`](crate::ReadOnceError::InvalidSecret)
    /// is returned; the container state does not change.
    #[must_use]
    pub fn validator(mut self, validator: Validator<T>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Applies deserialized [`ReadOnceOptions`].
    #[must_use]
    pub fn options(mut self, options: &ReadOnceOptions) -> Self {
        if let Some(label) = &options.label {
            self.label = Some(Cow::Owned(label.clone()));
        }
        self.compression = options.compression;
        self
    }

    /// Finalizes the builder into an empty container.
    #[must_use]
    pub fn build(self) -> ReadOnce<T, C> {
        ReadOnce::from_settings(Settings {
            label: self.label.unwrap_or(Cow::Borrowed(std::any::type_name::<T>())),
            compression: self.compression,
            validator: self.validator,
        })
    }
}

impl<T, C: VaultCipher> fmt::Debug for ReadOnceBuilder<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOnceBuilder")
            .field("label", &self.label)
            .field("compression", &self.compression)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}
