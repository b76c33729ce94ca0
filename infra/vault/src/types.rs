use aead::{AeadInOut, KeyInit};
use aes_gcm::Aes256Gcm;
use chacha20poly1305::ChaCha20Poly1305;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use zeroize::Zeroize;

// --- Aliases ---

pub type Aes = Aes256Gcm;
pub type ChaCha = ChaCha20Poly1305;

pub trait VaultCipher: AeadInOut + KeyInit + 'static {}
impl<T: AeadInOut + KeyInit + 'static> VaultCipher for T {}

/// Values that can live inside a read-once container.
///
/// The value is encoded with `postcard` before sealing and the caller's copy is
/// wiped with [`Zeroize`] right after encoding.
pub trait SecretValue: Serialize + DeserializeOwned + Zeroize {}
impl<T: Serialize + DeserializeOwned + Zeroize> SecretValue for T {}

/// Caller-owned precondition check, run before a value is sealed.
pub type Validator<T> = fn(&T) -> Result<(), Cow<'static, str>>;

/// The only text any read-once container ever renders.
pub const REDACTED: &str = "ReadOnce[secrets=*****]";

// --- Sealed format constants ---

/// Sealed blob version.
pub(crate) const PAYLOAD_VERSION_V1: u8 = 1;

/// Header layout: `[version: u8][flags: u8]`
pub(crate) const HEADER_LEN: usize = 2;

/// AEAD nonce length (96-bit).
pub(crate) const NONCE_LEN: usize = 12;

/// AEAD tag length (128-bit).
pub(crate) const TAG_LEN: usize = 16;

/// Ephemeral key length (256-bit).
pub(crate) const KEY_LEN: usize = 32;

/// Flag bit: plaintext was compressed before encryption.
pub(crate) const FLAG_COMPRESSED: u8 = 1 << 0;

// --- Configuration ---

/// Plain, deserializable container settings.
///
/// Hosts usually embed this in their own configuration files and apply it with
/// [`ReadOnceBuilder::options`](crate::ReadOnceBuilder::options).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadOnceOptions {
    /// Associated data the ciphertext is bound to. Defaults to the value's type name.
    pub label: Option<String>,
    /// LZ4-compress the encoded value before encryption.
    pub compression: bool,
}
