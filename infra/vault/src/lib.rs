//! Read-once containers for sensitive values.
//!
//! A [`ReadOnce`] holds a secret (password, token, connection string) that must be
//! released exactly once and must never leak through logs, debug output or
//! serialization on the way.
//!
//! ## Storage
//!
//! On every `add` the value is encoded with `postcard`, the caller's copy is wiped
//! and the bytes are sealed under a fresh per-value 256-bit key as a versioned blob:
//!
//! ```text
//! [V(1)][FLAGS(1)][NONCE(12)][CIPHERTEXT(N)][TAG(16)]
//! ```
//!
//! Keys never leave the container. Overwriting a secret rotates the key and zeroizes
//! the previous key and blob; so do consumption and drop.
//!
//! ## Lifecycle
//!
//! `EMPTY -> LOADED -> CONSUMED`. `get` on an empty container fails without changing
//! state; after the first successful (or corrupt) `get` the container is inert and
//! every call fails with [`ReadOnceError::AlreadyConsumed`].
//!
//! ## Redaction
//!
//! `Debug` and `Display` print [`REDACTED`]; `Serialize` fails; `Deserialize` fails.
//! Structs that embed a container inherit all of this through their derives.
//!
//! ## Examples
//!
//! ### Basic Usage via Prelude
//! ```rust
//! use readonce_vault::prelude::*;
//!
//! # fn main() -> Result<(), ReadOnceError> {
//! let mut secret = ReadOnce::<String>::new();
//! secret.add("first".to_owned())?;
//! secret.add("second".to_owned())?;
//!
//! assert_eq!(secret.to_string(), "ReadOnce[secrets=*****]");
//! assert_eq!(secret.get()?, "second");
//! assert!(secret.get().is_err());
//! # Ok(())
//! # }
//! ```
//!
//! ### Finalized Wrappers
//! ```rust
//! use readonce_vault::prelude::*;
//!
//! #[read_once(label = "db.password")]
//! pub struct DbPassword(String);
//!
//! # fn main() -> Result<(), ReadOnceError> {
//! let mut password = DbPassword::new("awesome_password".to_owned())?;
//! assert_eq!(format!("{password:?}"), REDACTED);
//! assert_eq!(password.get()?, "awesome_password");
//! # Ok(())
//! # }
//! ```
//!
//! The container cannot be copied:
//! ```compile_fail
//! use readonce_vault::ReadOnce;
//!
//! let secret = ReadOnce::<String>::new();
//! let copy = secret.clone();
//! ```
//!
//! compared:
//! ```compile_fail
//! use readonce_vault::ReadOnce;
//!
//! let a = ReadOnce::<String>::new();
//! let b = ReadOnce::<String>::new();
//! let _ = a == b;
//! ```
//!
//! or opened up by a wrapper:
//! ```compile_fail
//! use readonce_vault::read_once;
//!
//! #[read_once]
//! pub struct Token(pub String);
//! ```
//!
//! ```compile_fail
//! use readonce_vault::read_once;
//!
//! #[read_once]
//! #[derive(Clone)]
//! pub struct Token(String);
//! ```

mod builder;
mod engine;
mod error;
mod seal;
mod shared;
mod types;

pub use builder::ReadOnceBuilder;
pub use engine::ReadOnce;
pub use error::{ReadOnceError, ReadOnceErrorExt};
pub use readonce_derive::read_once;
pub use serde;
pub use shared::SharedReadOnce;
pub use types::{REDACTED, ReadOnceOptions, SecretValue, Validator};

pub mod prelude {
    pub use crate::builder::ReadOnceBuilder;
    pub use crate::engine::ReadOnce;
    pub use crate::error::{ReadOnceError, ReadOnceErrorExt};
    pub use crate::shared::SharedReadOnce;
    pub use crate::types::{Aes, ChaCha, REDACTED, ReadOnceOptions};
    pub use readonce_derive::read_once;
}

pub mod algorithms {
    pub use crate::types::{Aes, ChaCha, VaultCipher};
}
