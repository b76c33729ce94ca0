use crate::macros::derived_trait_names;
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::parse::Parser;
use syn::spanned::Spanned;
use syn::{Expr, Fields, ItemStruct, Lit, LitBool, LitStr, Meta, MetaNameValue, Path, Visibility};

/// Traits that would copy, compare, print or dump the wrapped secret.
const FORBIDDEN_DERIVES: &[&str] = &[
    "Clone",
    "Copy",
    "Debug",
    "PartialEq",
    "Eq",
    "Hash",
    "PartialOrd",
    "Ord",
    "Default",
    "Serialize",
    "Deserialize",
];

const EXTENSION_REJECTED: &str = "Extension rejected: read-once wrappers are final";

#[derive(Default)]
struct WrapperArgs {
    label: Option<LitStr>,
    validate: Option<Path>,
    compression: Option<LitBool>,
}

fn parse_args(args: TokenStream) -> Result<WrapperArgs, TokenStream> {
    let parser = syn::punctuated::Punctuated::<Meta, syn::Token![,]>::parse_terminated;
    let metas = parser.parse2(args).map_err(|err| err.to_compile_error())?;
    let mut parsed = WrapperArgs::default();

    for meta in metas {
        let Meta::NameValue(name_value) = meta else {
            return Err(syn::Error::new_spanned(meta, "Expected `key = value`").to_compile_error());
        };

        let key = name_value.path.get_ident().map(ToString::to_string).unwrap_or_default();
        match key.as_str() {
            "label" => set_once(&mut parsed.label, &name_value, string_literal)?,
            "validate" => set_once(&mut parsed.validate, &name_value, validator_path)?,
            "compression" => set_once(&mut parsed.compression, &name_value, bool_literal)?,
            _ => {
                return Err(syn::Error::new_spanned(
                    &name_value.path,
                    "Only `label = \"...\"`, `validate = path` and `compression = bool` are supported",
                )
                .to_compile_error());
            },
        }
    }

    Ok(parsed)
}

fn set_once<T>(
    slot: &mut Option<T>,
    name_value: &MetaNameValue,
    parse: fn(&Expr) -> Result<T, TokenStream>,
) -> Result<(), TokenStream> {
    if slot.is_some() {
        return Err(syn::Error::new_spanned(name_value, "Duplicate argument").to_compile_error());
    }
    *slot = Some(parse(&name_value.value)?);
    Ok(())
}

fn string_literal(value: &Expr) -> Result<LitStr, TokenStream> {
    match value {
        Expr::Lit(expr_lit) => match &expr_lit.lit {
            Lit::Str(lit) => Ok(lit.clone()),
            _ => Err(syn::Error::new_spanned(value, "Expected string literal").to_compile_error()),
        },
        _ => Err(syn::Error::new_spanned(value, "Expected string literal").to_compile_error()),
    }
}

fn bool_literal(value: &Expr) -> Result<LitBool, TokenStream> {
    match value {
        Expr::Lit(expr_lit) => match &expr_lit.lit {
            Lit::Bool(lit) => Ok(lit.clone()),
            _ => Err(syn::Error::new_spanned(value, "Expected `true` or `false`").to_compile_error()),
        },
        _ => Err(syn::Error::new_spanned(value, "Expected `true` or `false`").to_compile_error()),
    }
}

fn validator_path(value: &Expr) -> Result<Path, TokenStream> {
    match value {
        Expr::Path(expr_path) => Ok(expr_path.path.clone()),
        _ => Err(syn::Error::new_spanned(value, "Expected a path to a validator function")
            .to_compile_error()),
    }
}

fn reject(span: Span, reason: &str) -> TokenStream {
    syn::Error::new(span, format!("{EXTENSION_REJECTED}; {reason}")).to_compile_error()
}

fn check_shape(input: &ItemStruct) -> Result<&syn::Type, TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(reject(input.ident.span(), "generic wrappers are not supported"));
    }

    let Fields::Unnamed(fields) = &input.fields else {
        return Err(reject(
            input.ident.span(),
            "expected a tuple struct with a single private field, e.g. `struct Password(String);`",
        ));
    };
    let mut iter = fields.unnamed.iter();
    let (Some(field), None) = (iter.next(), iter.next()) else {
        return Err(reject(fields.span(), "exactly one wrapped value is allowed"));
    };

    if !matches!(field.vis, Visibility::Inherited) {
        return Err(reject(field.vis.span(), "the wrapped value must stay private"));
    }

    let derived = derived_trait_names(&input.attrs);
    if let Some(forbidden) = FORBIDDEN_DERIVES.iter().find(|name| derived.contains(**name)) {
        return Err(reject(
            input.ident.span(),
            &format!("deriving `{forbidden}` would expose or duplicate the secret"),
        ));
    }

    Ok(&field.ty)
}

/// Expands the `#[read_once]` macro.
pub fn expand_read_once(args: TokenStream, input: ItemStruct) -> TokenStream {
    let args = match parse_args(args) {
        Ok(args) => args,
        Err(err) => return err,
    };
    let ty = match check_shape(&input) {
        Ok(ty) => ty,
        Err(err) => return err,
    };

    let ItemStruct { attrs, vis, ident, .. } = &input;
    let label = args.label.unwrap_or_else(|| LitStr::new(&ident.to_string(), ident.span()));
    let compression = args.compression.is_some_and(|lit| lit.value);
    let validator = args.validate.map(|path| quote! { .validator(#path) });

    quote! {
        #(#attrs)*
        #vis struct #ident {
            inner: ::readonce_vault::ReadOnce<#ty>,
        }

        #[automatically_derived]
        #[allow(dead_code)]
        impl #ident {
            /// Associated data the ciphertext of this wrapper is bound to.
            pub const LABEL: &'static str = #label;

            /// Creates the wrapper and seals `value` into it.
            ///
            /// # Errors
            /// See `readonce_vault::ReadOnce::add`.
            #vis fn new(value: #ty) -> ::core::result::Result<Self, ::readonce_vault::ReadOnceError> {
                let mut inner = ::readonce_vault::ReadOnce::<#ty>::builder()
                    .label(Self::LABEL)
                    .compression(#compression)
                    #validator
                    .build();
                inner.add(value)?;
                Ok(Self { inner })
            }

            /// Replaces the sealed value.
            ///
            /// # Errors
            /// See `readonce_vault::ReadOnce::add`.
            #vis fn add(&mut self, value: #ty) -> ::core::result::Result<(), ::readonce_vault::ReadOnceError> {
                self.inner.add(value)
            }

            /// Releases the sealed value; every later call fails.
            ///
            /// # Errors
            /// See `readonce_vault::ReadOnce::get`.
            #vis fn get(&mut self) -> ::core::result::Result<#ty, ::readonce_vault::ReadOnceError> {
                self.inner.get()
            }

            /// `1` while a value is waiting to be released, `0` otherwise.
            #vis const fn len(&self) -> usize {
                self.inner.len()
            }

            #vis const fn is_empty(&self) -> bool {
                self.inner.is_empty()
            }

            /// Releases the sealed value and drops the wrapper.
            ///
            /// # Errors
            /// See `readonce_vault::ReadOnce::get`.
            #vis fn into_secret(self) -> ::core::result::Result<#ty, ::readonce_vault::ReadOnceError> {
                self.inner.into_secret()
            }
        }

        #[automatically_derived]
        impl ::core::fmt::Debug for #ident {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Debug::fmt(&self.inner, f)
            }
        }

        #[automatically_derived]
        impl ::core::fmt::Display for #ident {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.inner, f)
            }
        }

        #[automatically_derived]
        impl ::readonce_vault::serde::Serialize for #ident {
            fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: ::readonce_vault::serde::Serializer,
            {
                ::readonce_vault::serde::Serialize::serialize(&self.inner, serializer)
            }
        }

        #[automatically_derived]
        impl<'de> ::readonce_vault::serde::Deserialize<'de> for #ident {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::readonce_vault::serde::Deserializer<'de>,
            {
                let inner = <::readonce_vault::ReadOnce<#ty> as ::readonce_vault::serde::Deserialize<'de>>::deserialize(deserializer)?;
                Ok(Self { inner })
            }
        }
    }
}
