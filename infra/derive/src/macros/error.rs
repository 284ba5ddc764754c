use fxhash::FxHashSet;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Field, Fields, FieldsNamed, Ident, Type, Variant};

struct ErrorVariant<'a> {
    ident: &'a Ident,
    source: Option<&'a Field>,
    cfg_attrs: Vec<Attribute>,
}

impl ErrorVariant<'_> {
    fn source_parts(&self) -> Option<(&Ident, &Type)> {
        let field = self.source?;
        Some((field.ident.as_ref()?, &field.ty))
    }
}

pub fn expand(input: DeriveInput) -> TokenStream {
    let Data::Enum(data) = &input.data else {
        return syn::Error::new_spanned(&input.ident, "knobs_error can only be applied to enums")
            .to_compile_error();
    };

    let variants = match data.variants.iter().map(inspect_variant).collect::<Result<Vec<_>, _>>()
    {
        Ok(variants) => variants,
        Err(err) => return err.to_compile_error(),
    };

    let name = &input.ident;
    let ext = format_ident!("{}Ext", name);

    let derives = match missing_derives(&input) {
        Ok(derives) => derives,
        Err(err) => return err.to_compile_error(),
    };
    let inherent = inherent_impl(name, &variants);
    let ext_trait = ext_trait(name, &ext);
    let source_impls = variants.iter().filter_map(|v| source_impl(name, &ext, v));

    quote! {
        #derives
        #input

        #inherent
        #ext_trait
        #(#source_impls)*

        #[allow(dead_code)]
        fn format_context(
            context: &Option<std::borrow::Cow<'static, str>>,
        ) -> std::borrow::Cow<'static, str> {
            match context {
                Some(c) => std::borrow::Cow::Owned(format!(" ({c})")),
                None => std::borrow::Cow::Borrowed(""),
            }
        }
    }
}

fn inspect_variant(v: &Variant) -> syn::Result<ErrorVariant<'_>> {
    let Fields::Named(fields) = &v.fields else {
        return Err(syn::Error::new_spanned(v, "knobs_error variants must use named fields"));
    };

    check_context_field(v, fields)?;

    Ok(ErrorVariant {
        ident: &v.ident,
        source: fields.named.iter().find(|f| is_source_field(f)),
        cfg_attrs: v.attrs.iter().filter(|a| a.path().is_ident("cfg")).cloned().collect(),
    })
}

fn check_context_field(v: &Variant, fields: &FieldsNamed) -> syn::Result<()> {
    let context = fields.named.iter().find(|f| f.ident.as_ref().is_some_and(|i| i == "context"));
    match context {
        Some(field) if is_context_type(&field.ty) => Ok(()),
        Some(field) => Err(syn::Error::new_spanned(
            &field.ty,
            "context field must be Option<Cow<'static, str>>",
        )),
        None => Err(syn::Error::new_spanned(
            &v.ident,
            "knobs_error requires `context: Option<Cow<'static, str>>` on every variant",
        )),
    }
}

fn is_source_field(field: &Field) -> bool {
    field.ident.as_ref().is_some_and(|i| i == "source")
        || field.attrs.iter().any(|a| a.path().is_ident("source") || a.path().is_ident("from"))
}

fn missing_derives(input: &DeriveInput) -> syn::Result<TokenStream> {
    let present = derived_traits(input)?;
    let mut missing = Vec::new();
    if !present.contains("Debug") {
        missing.push(quote! { Debug });
    }
    if !present.contains("Error") {
        missing.push(quote! { ::thiserror::Error });
    }
    if missing.is_empty() {
        return Ok(quote! {});
    }
    Ok(quote! { #[derive(#(#missing),*)] })
}

fn inherent_impl(name: &Ident, variants: &[ErrorVariant<'_>]) -> TokenStream {
    let kind_arms = variants.iter().map(|v| {
        let (ident, cfg) = (v.ident, &v.cfg_attrs);
        let label = ident.to_string();
        quote! { #(#cfg)* Self::#ident { .. } => #label, }
    });
    let read_arms = variants.iter().map(|v| {
        let (ident, cfg) = (v.ident, &v.cfg_attrs);
        quote! { #(#cfg)* Self::#ident { context, .. } => context.as_deref(), }
    });
    let write_arms = variants.iter().map(|v| {
        let (ident, cfg) = (v.ident, &v.cfg_attrs);
        quote! { #(#cfg)* Self::#ident { context, .. } => *context = Some(value.into()), }
    });

    quote! {
        #[automatically_derived]
        impl #name {
            /// Name of the variant, suitable as a structured log field.
            #[must_use]
            pub const fn kind(&self) -> &'static str {
                match self {
                    #(#kind_arms)*
                }
            }

            /// Context attached with `.context(..)`, if any.
            #[must_use]
            pub fn context_message(&self) -> Option<&str> {
                match self {
                    #(#read_arms)*
                }
            }

            /// Replaces the attached context.
            #[must_use]
            pub fn with_context(mut self, value: impl Into<std::borrow::Cow<'static, str>>) -> Self {
                match &mut self {
                    #(#write_arms)*
                }
                self
            }
        }
    }
}

fn ext_trait(name: &Ident, ext: &Ident) -> TokenStream {
    quote! {
        pub trait #ext<T> {
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Result<T, #name>;
        }

        #[automatically_derived]
        impl<T> #ext<T> for Result<T, #name> {
            #[inline]
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Self {
                self.map_err(|e| e.with_context(context))
            }
        }
    }
}

fn source_impl(name: &Ident, ext: &Ident, v: &ErrorVariant<'_>) -> Option<TokenStream> {
    let (field, ty) = v.source_parts()?;
    let ident = v.ident;
    let cfg = &v.cfg_attrs;

    Some(quote! {
        #(#cfg)*
        #[automatically_derived]
        impl From<#ty> for #name {
            #[inline]
            fn from(#field: #ty) -> Self {
                Self::#ident { #field, context: None }
            }
        }

        #(#cfg)*
        #[automatically_derived]
        impl<T> #ext<T> for Result<T, #ty> {
            #[inline]
            fn context(
                self,
                context: impl Into<std::borrow::Cow<'static, str>>,
            ) -> Result<T, #name> {
                self.map_err(|#field| #name::#ident { #field, context: Some(context.into()) })
            }
        }
    })
}

/// Trait names already derived on the enum. A malformed `#[derive]` is reported as is.
fn derived_traits(input: &DeriveInput) -> syn::Result<FxHashSet<String>> {
    let mut traits = FxHashSet::default();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("derive")) {
        attr.parse_nested_meta(|meta| {
            if let Some(seg) = meta.path.segments.last() {
                traits.insert(seg.ident.to_string());
            }
            Ok(())
        })?;
    }
    Ok(traits)
}

/// Matches `Option<Cow<'static, str>>`, with or without leading paths.
fn is_context_type(ty: &Type) -> bool {
    let Some(option_args) = last_segment_args(ty, "Option") else {
        return false;
    };
    let Some(syn::GenericArgument::Type(inner)) = option_args.first() else {
        return false;
    };
    let Some(cow_args) = last_segment_args(inner, "Cow") else {
        return false;
    };

    let mut args = cow_args.iter();
    let static_lifetime =
        matches!(args.next(), Some(syn::GenericArgument::Lifetime(lt)) if lt.ident == "static");
    let str_type = matches!(
        args.next(),
        Some(syn::GenericArgument::Type(Type::Path(p)))
            if p.path.segments.last().is_some_and(|s| s.ident == "str")
    );
    static_lifetime && str_type
}

fn last_segment_args<'a>(
    ty: &'a Type,
    ident: &str,
) -> Option<Vec<&'a syn::GenericArgument>> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != ident {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    Some(args.args.iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_existing_derives_are_not_repeated() {
        let input: DeriveInput = parse_quote! {
            #[derive(Debug, thiserror::Error)]
            pub enum SeedError {
                #[error("Missing{}", format_context(.context))]
                Missing { context: Option<Cow<'static, str>> },
            }
        };

        assert!(missing_derives(&input).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_derive_is_reported() {
        let input: DeriveInput = parse_quote! {
            #[derive(Debug, "Clone")]
            pub enum SeedError {
                #[error("Missing{}", format_context(.context))]
                Missing { context: Option<Cow<'static, str>> },
            }
        };

        assert!(derived_traits(&input).is_err());

        let expanded = expand(input).to_string();
        assert!(expanded.contains("compile_error"));
        assert!(!expanded.contains("thiserror"));
    }
}
