use crate::macros::derived_trait_names;
use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::{
    Attribute, Data, DeriveInput, Field, Fields, FieldsNamed, GenericArgument, Ident,
    PathArguments, Type, Variant,
};

const NAMED_FIELDS_REQUIRED: &str =
    "readonce_error requires named fields (at least `context`) on every variant";
const CONTEXT_REQUIRED: &str =
    "readonce_error requires `context: Option<Cow<'static, str>>` for variants with a source";
const CONTEXT_TYPE: &str = "context field must be Option<Cow<'static, str>>";

/// A variant reduced to what the generated impls need.
struct ErrorVariant {
    ident: Ident,
    cfg_attrs: Vec<Attribute>,
    has_context: bool,
    source: Option<(Ident, Type)>,
}

/// The annotated enum, validated.
struct ErrorEnum {
    name: Ident,
    ext: Ident,
    variants: Vec<ErrorVariant>,
}

pub fn expand_derive(input: DeriveInput) -> TokenStream {
    match ErrorEnum::parse(&input) {
        Ok(model) => model.expand(&input),
        Err(err) => err.to_compile_error(),
    }
}

impl ErrorVariant {
    fn parse(variant: &Variant) -> syn::Result<Self> {
        let Fields::Named(fields) = &variant.fields else {
            return Err(syn::Error::new(variant.ident.span(), NAMED_FIELDS_REQUIRED));
        };

        let has_context = context_field(fields)?.is_some();
        let source = source_field(fields)
            .and_then(|field| field.ident.clone().map(|ident| (ident, field.ty.clone())));

        if source.is_some() && !has_context {
            return Err(syn::Error::new(variant.ident.span(), CONTEXT_REQUIRED));
        }

        Ok(Self {
            ident: variant.ident.clone(),
            cfg_attrs: variant.attrs.iter().filter(|a| a.path().is_ident("cfg")).cloned().collect(),
            has_context,
            source,
        })
    }

    fn is_internal(&self) -> bool {
        self.ident == "Internal"
    }
}

impl ErrorEnum {
    /// Validates every variant and reports all offending ones at once.
    fn parse(input: &DeriveInput) -> syn::Result<Self> {
        let Data::Enum(data) = &input.data else {
            return Err(syn::Error::new(
                input.ident.span(),
                "readonce_error can only be applied to enums",
            ));
        };

        let mut variants = Vec::with_capacity(data.variants.len());
        let mut failure: Option<syn::Error> = None;

        for variant in &data.variants {
            match ErrorVariant::parse(variant) {
                Ok(parsed) => variants.push(parsed),
                Err(err) => match failure.as_mut() {
                    Some(all) => all.combine(err),
                    None => failure = Some(err),
                },
            }
        }

        if let Some(err) = failure {
            return Err(err);
        }

        Ok(Self { name: input.ident.clone(), ext: format_ident!("{}Ext", input.ident), variants })
    }

    fn expand(&self, input: &DeriveInput) -> TokenStream {
        let derives = missing_derives(&input.attrs);
        let context_trait = self.context_trait();
        let kind_impl = self.kind_impl();
        let source_impls = self.variants.iter().filter_map(|v| self.source_impls(v));
        let internal_impls = self.internal_impls();

        quote! {
            #[allow(non_shorthand_field_patterns)]
            #derives
            #input

            #context_trait
            #kind_impl
            #(#source_impls)*
            #internal_impls

            #[allow(dead_code)]
            fn format_context(context: &Option<std::borrow::Cow<'static, str>>) -> std::borrow::Cow<'static, str> {
                context.as_ref().map_or(std::borrow::Cow::Borrowed(""), |c| std::borrow::Cow::Owned(format!(" ({c})")))
            }
        }
    }

    /// `...Ext::context` for results that already carry this error.
    fn context_trait(&self) -> TokenStream {
        let Self { name, ext, .. } = self;
        let arms = self.variants.iter().filter(|v| v.has_context).map(|v| {
            let cfg_attrs = &v.cfg_attrs;
            let ident = &v.ident;
            quote! { #(#cfg_attrs)* #name::#ident { context: c, .. } => *c = Some(context.into()), }
        });

        quote! {
            pub trait #ext<T> {
                fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Result<T, #name>;
            }

            #[automatically_derived]
            impl<T> #ext<T> for Result<T, #name> {
                #[inline]
                fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Self {
                    self.map_err(|mut e| {
                        match &mut e {
                            #( #arms )*
                            _ => {}
                        }
                        e
                    })
                }
            }
        }
    }

    fn kind_impl(&self) -> TokenStream {
        let name = &self.name;
        let arms = self.variants.iter().map(|v| {
            let cfg_attrs = &v.cfg_attrs;
            let ident = &v.ident;
            let kind = ident.to_string();
            quote! { #(#cfg_attrs)* Self::#ident { .. } => #kind, }
        });

        quote! {
            #[automatically_derived]
            impl #name {
                /// Returns the variant name, suitable as a structured log field.
                #[must_use]
                pub const fn kind(&self) -> &'static str {
                    match self {
                        #( #arms )*
                    }
                }
            }
        }
    }

    /// `From<source>` plus `.context()` on results carrying the source error.
    fn source_impls(&self, v: &ErrorVariant) -> Option<TokenStream> {
        if v.is_internal() {
            return None;
        }
        let (field, ty) = v.source.as_ref()?;
        let Self { name, ext, .. } = self;
        let ident = &v.ident;
        let cfg_attrs = &v.cfg_attrs;

        Some(quote! {
            #(#cfg_attrs)*
            #[automatically_derived]
            impl From<#ty> for #name {
                #[inline]
                fn from(#field: #ty) -> Self { Self::#ident { #field, context: None } }
            }

            #(#cfg_attrs)*
            impl<T> #ext<T> for std::result::Result<T, #ty> {
                #[inline]
                fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> std::result::Result<T, #name> {
                    self.map_err(|#field| #name::#ident { #field, context: Some(context.into()) })
                }
            }
        })
    }

    fn internal_impls(&self) -> TokenStream {
        let Some(internal) = self.variants.iter().find(|v| v.is_internal()) else {
            return quote!();
        };
        let name = &self.name;
        let cfg_attrs = &internal.cfg_attrs;

        quote! {
            #(#cfg_attrs)*
            impl From<&'static str> for #name {
                #[inline]
                fn from(s: &'static str) -> Self { Self::Internal { message: std::borrow::Cow::Borrowed(s), context: None } }
            }
            #(#cfg_attrs)*
            impl From<String> for #name {
                #[inline]
                fn from(s: String) -> Self { Self::Internal { message: std::borrow::Cow::Owned(s), context: None } }
            }
        }
    }
}

fn missing_derives(attrs: &[Attribute]) -> TokenStream {
    let derived = derived_trait_names(attrs);
    let mut derives = Vec::new();
    if !derived.contains("Debug") {
        derives.push(quote! { Debug });
    }
    if !derived.contains("Error") {
        derives.push(quote! { ::thiserror::Error });
    }

    if derives.is_empty() { quote! {} } else { quote! { #[derive(#(#derives),*)] } }
}

fn context_field(fields: &FieldsNamed) -> syn::Result<Option<&Field>> {
    let Some(field) = fields.named.iter().find(|f| f.ident.as_ref().is_some_and(|i| i == "context"))
    else {
        return Ok(None);
    };

    if is_context_type(&field.ty) {
        Ok(Some(field))
    } else {
        let span = field.ident.as_ref().map_or_else(Span::call_site, Ident::span);
        Err(syn::Error::new(span, CONTEXT_TYPE))
    }
}

fn source_field(fields: &FieldsNamed) -> Option<&Field> {
    fields.named.iter().find(|field| {
        field.ident.as_ref().is_some_and(|ident| ident == "source")
            || field.attrs.iter().any(|a| a.path().is_ident("source") || a.path().is_ident("from"))
    })
}

/// Matches `Option<Cow<'static, str>>` on the last path segments.
fn is_context_type(ty: &Type) -> bool {
    let Some(option) = generic_args(ty, "Option") else {
        return false;
    };
    let [GenericArgument::Type(cow)] = option.as_slice() else {
        return false;
    };
    let Some(cow) = generic_args(cow, "Cow") else {
        return false;
    };

    match cow.as_slice() {
        [GenericArgument::Lifetime(lt), GenericArgument::Type(Type::Path(inner))] => {
            lt.ident == "static" && inner.path.is_ident("str")
        },
        _ => false,
    }
}

fn generic_args<'a>(ty: &'a Type, ident: &str) -> Option<Vec<&'a GenericArgument>> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last().filter(|segment| segment.ident == ident)?;
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    Some(args.args.iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(item: TokenStream) -> String {
        let input: DeriveInput = syn::parse2(item).expect("test input should parse");
        expand_derive(input).to_string()
    }

    #[test]
    fn test_context_type_matching() {
        let accepted: Type = syn::parse_quote!(Option<std::borrow::Cow<'static, str>>);
        assert!(is_context_type(&accepted));

        for rejected in [
            quote!(Option<String>),
            quote!(Option<Cow<'a, str>>),
            quote!(Cow<'static, str>),
            quote!(Option<Cow<'static, [u8]>>),
        ] {
            let ty: Type = syn::parse2(rejected).unwrap();
            assert!(!is_context_type(&ty), "should be rejected: {}", quote!(#ty));
        }
    }

    #[test]
    fn test_every_bad_variant_is_reported() {
        let out = expand(quote! {
            enum SealError {
                Io(std::io::Error),
                Postcard { source: postcard::Error },
                Consumed { context: Option<Cow<'static, str>> },
            }
        });

        assert_eq!(out.matches("compile_error").count(), 2, "both variants should fail: {out}");
        assert!(out.contains("named fields"));
        assert!(out.contains("for variants with a source"));
    }

    #[test]
    fn test_kind_arms_cover_variants() {
        let out = expand(quote! {
            enum SealError {
                #[error("Consumed")]
                Consumed { context: Option<Cow<'static, str>> },
                #[error("Internal")]
                Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
            }
        });

        assert!(out.contains("Self :: Consumed { .. } => \"Consumed\""));
        assert!(out.contains("Self :: Internal { .. } => \"Internal\""));
        assert!(out.contains("impl From < & 'static str > for SealError"));
    }

    #[test]
    fn test_struct_is_rejected() {
        let out = expand(quote! { struct SealError { context: Option<Cow<'static, str>> } });
        assert!(out.contains("can only be applied to enums"));
    }
}
