//! # Read-Once Errors
//!
//! This module defines the [`ReadOnceError`] enum returned by every rejected
//! operation on a read-once container. None of these errors is retried
//! internally and none carries secret material in its message.

use std::borrow::Cow;

/// A specialized [`ReadOnceError`] enum for read-once container failures.
#[readonce_derive::readonce_error]
pub enum ReadOnceError {
    /// The secret was already released, or nothing was ever added.
    #[error("Sensitive data was already consumed{}", format_context(.context))]
    AlreadyConsumed { context: Option<Cow<'static, str>> },

    /// A serializer asked for a snapshot of the container.
    #[error("Sensitive data can not be serialized{}", format_context(.context))]
    SerializationRejected { context: Option<Cow<'static, str>> },

    /// An extension would expose the container's internals.
    ///
    /// Rust has no inheritance, so this is reported at compile time by the
    /// `read_once` attribute macro; it is listed here for completeness of the
    /// error vocabulary.
    #[error("Extension rejected{}: read-once wrappers are final", format_context(.context))]
    ExtensionRejected { context: Option<Cow<'static, str>> },

    /// Something outside the container tried to rebuild or overwrite its state.
    #[error(
        "Not allowed on sensitive value{}: state changes only through add and get",
        format_context(.context)
    )]
    DirectStateMutationRejected { context: Option<Cow<'static, str>> },

    /// The configured validator refused the value before it was sealed.
    #[error("Invalid secret{}: {message}", format_context(.context))]
    InvalidSecret { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Failure during key generation or encryption.
    #[error("Encryption error{}: {message}", format_context(.context))]
    Encryption { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Failure during decryption.
    ///
    /// This usually indicates tampered or corrupted ciphertext.
    #[error("Decryption error{}: {message}", format_context(.context))]
    Decryption { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The sealed blob is malformed or too short.
    #[error("Invalid payload{}: {message}", format_context(.context))]
    InvalidPayload { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Failure while encoding or decoding the value with Postcard.
    #[error("Serialization error{}: {source}", format_context(.context))]
    Serialization { source: postcard::Error, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal read-once error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
