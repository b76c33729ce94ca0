#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros for the read-once workspace.
//! This crate provides attribute macros that remove the boilerplate around
//! error enums and finalized secret wrappers.
//!
//! ## Usage
//! Consumers normally reach these macros through the `readonce-vault` re-exports
//! (`readonce_vault::read_once`). The error macro is used directly by the
//! infrastructure crates:
//! ```toml
//! [dependencies]
//! readonce-derive = { path = "../infra/derive" }
//! ```
//!
//! Docstring examples are `ignore`d to avoid compiling in this crate; the
//! consuming crates exercise them in their own tests.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemStruct, parse_macro_input};

/// Attribute macro that turns a single-field tuple struct into a finalized
/// read-once wrapper.
///
/// The wrapped value is moved into an opaque `readonce_vault::ReadOnce<T>`
/// on construction and can be released exactly once.
///
/// # Generated Items
///
/// * `new(value)`: builds the wrapper and pre-loads the secret.
/// * `add(value)`, `get()`, `into_secret()`, `len()`, `is_empty()`: forwarded to the container.
/// * `LABEL`: the label the ciphertext is bound to.
/// * `Debug`/`Display`: always render the redacted marker.
/// * `Serialize`: always fails with `SerializationRejected`.
/// * `Deserialize`: always fails with `DirectStateMutationRejected`.
///
/// # Arguments
///
/// * `label = "..."` - Associated data for the ciphertext. Defaults to the struct name.
/// * `validate = path::to_fn` - A `fn(&T) -> Result<(), Cow<'static, str>>` run before sealing.
/// * `compression = true` - Enables LZ4 compression before encryption.
///
/// # Errors
///
/// Emits a compile-time error when the wrapper could leak its secret:
/// * the struct is not a tuple struct with exactly one field,
/// * the inner field is not private,
/// * the struct is generic,
/// * the struct derives a copy, comparison, debug, default or serde trait.
///
/// # Example
///
/// ```rust,ignore
/// use readonce_vault::read_once;
/// use std::borrow::Cow;
///
/// fn at_least_eight(value: &String) -> Result<(), Cow<'static, str>> {
///     if value.len() < 8 { Err("password is too short".into()) } else { Ok(()) }
/// }
///
/// #[read_once(label = "db.password", validate = at_least_eight)]
/// pub struct DbPassword(String);
///
/// let mut password = DbPassword::new("awesome_password".to_owned())?;
/// assert_eq!(password.get()?, "awesome_password");
/// assert!(password.get().is_err());
/// ```
#[proc_macro_attribute]
pub fn read_once(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    macros::wrapper::expand_read_once(args.into(), input).into()
}

/// A high-level attribute macro for defining domain-specific error enums.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]`.
/// * **Context Support**: Generates a companion `...Ext` trait that adds `.context()`
///   to any `Result` that can be converted into this error type.
/// * **Standard Conversions**: Implements `From<T>` for variants containing a `#[source]` field,
///   enabling the use of the `?` operator for upstream errors.
/// * **Internal Fallback**: Provides specialized `From<&str>` and `From<String>` implementations
///   if an `Internal` variant is present.
/// * **Kind Accessor**: Generates `kind()`, returning the variant name as a `&'static str`
///   so failures can be logged as structured fields without formatting payloads.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum**.
/// 2. Variants that support context must include a `context: Option<Cow<'static, str>>` field.
/// 3. Variants wrapping external errors must include a `source: T` field or a field marked
///    with `#[source]`/`#[from]` (compatible with `thiserror`).
/// 4. Tuple or unit variants are rejected to keep error wiring explicit and reliable.
///
/// # Example
///
/// ```rust,ignore
/// use readonce_derive::readonce_error;
/// use std::borrow::Cow;
///
/// #[readonce_error]
/// pub enum SealError {
///     #[error("Encoding error{}: {source}", format_context(.context))]
///     Encoding { source: postcard::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Already consumed{}", format_context(.context))]
///     AlreadyConsumed { context: Option<Cow<'static, str>> },
/// }
///
/// fn encode(value: &str) -> Result<Vec<u8>, SealError> {
///     postcard::to_stdvec(value).context("Encoding secret")
/// }
///
/// assert_eq!(SealError::AlreadyConsumed { context: None }.kind(), "AlreadyConsumed");
/// ```
#[proc_macro_attribute]
pub fn readonce_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}
