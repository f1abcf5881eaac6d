use fxhash::FxHashSet;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Field, Fields, FieldsNamed, Ident, Type, Variant};

/// What the expansion needs to know about one enum variant.
struct VariantPlan<'a> {
    ident: &'a Ident,
    source: Option<(&'a Ident, &'a Type)>,
    has_context: bool,
    has_message: bool,
    cfg_attrs: Vec<Attribute>,
}

pub fn expand_derive(input: DeriveInput) -> TokenStream {
    let name = &input.ident;
    let ext_trait = format_ident!("{}Ext", name);

    let Data::Enum(data) = &input.data else {
        return quote! { compile_error!("casefile_error can only be applied to enums"); };
    };

    let plans = match data.variants.iter().map(plan_variant).collect::<Result<Vec<_>, _>>() {
        Ok(plans) => plans,
        Err(err) => return err,
    };
    if let Some(err) = missing_context_error(&plans) {
        return err;
    }

    let derives = missing_derives(&input);
    let context_trait = context_trait(name, &ext_trait, &plans);
    let from_impls = plans.iter().filter_map(|plan| source_conversion(name, &ext_trait, plan));
    let message_impls = message_conversions(name, &plans);
    let kind_impl = kind_accessor(name, &plans);

    quote! {
        #[allow(non_shorthand_field_patterns)]
        #derives
        #input

        #context_trait
        #(#from_impls)*
        #message_impls
        #kind_impl

        #[allow(dead_code)]
        fn format_context(context: &Option<std::borrow::Cow<'static, str>>) -> std::borrow::Cow<'static, str> {
            context.as_ref().map_or(std::borrow::Cow::Borrowed(""), |c| std::borrow::Cow::Owned(format!(" ({c})")))
        }
    }
}

fn plan_variant(variant: &Variant) -> Result<VariantPlan<'_>, TokenStream> {
    let Fields::Named(fields) = &variant.fields else {
        return Err(syn::Error::new_spanned(
            variant,
            "casefile_error requires named fields so source/context wiring stays explicit",
        )
        .to_compile_error());
    };

    let has_context = context_field(fields)?.is_some();
    let source = source_field(fields).and_then(|f| f.ident.as_ref().map(|ident| (ident, &f.ty)));
    let has_message = fields.named.iter().any(|f| f.ident.as_ref().is_some_and(|i| i == "message"))
        && fields.named.len() <= 2;

    Ok(VariantPlan {
        ident: &variant.ident,
        source,
        has_context,
        has_message,
        cfg_attrs: variant.attrs.iter().filter(|a| a.path().is_ident("cfg")).cloned().collect(),
    })
}

fn context_field(fields: &FieldsNamed) -> Result<Option<&Field>, TokenStream> {
    let Some(field) = fields.named.iter().find(|f| f.ident.as_ref().is_some_and(|i| i == "context"))
    else {
        return Ok(None);
    };
    if is_optional_static_cow(&field.ty) {
        Ok(Some(field))
    } else {
        Err(syn::Error::new_spanned(&field.ty, "context field must be Option<Cow<'static, str>>")
            .to_compile_error())
    }
}

fn source_field(fields: &FieldsNamed) -> Option<&Field> {
    fields.named.iter().find(|field| {
        field.ident.as_ref().is_some_and(|ident| ident == "source")
            || field.attrs.iter().any(|a| a.path().is_ident("source") || a.path().is_ident("from"))
    })
}

fn missing_derives(input: &DeriveInput) -> TokenStream {
    let present = derived_traits(input);
    let mut wanted = Vec::new();
    if !present.contains("Debug") {
        wanted.push(quote! { Debug });
    }
    if !present.contains("Error") {
        wanted.push(quote! { ::thiserror::Error });
    }
    if wanted.is_empty() { quote! {} } else { quote! { #[derive(#(#wanted),*)] } }
}

fn context_trait(name: &Ident, ext_trait: &Ident, plans: &[VariantPlan<'_>]) -> TokenStream {
    let arms = plans.iter().filter(|p| p.has_context).map(|p| {
        let cfg_attrs = &p.cfg_attrs;
        let ident = p.ident;
        quote! { #(#cfg_attrs)* #name::#ident { context: slot, .. } => *slot = Some(context.into()), }
    });

    quote! {
        pub trait #ext_trait<T> {
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Result<T, #name>;
        }

        #[automatically_derived]
        impl<T> #ext_trait<T> for Result<T, #name> {
            #[inline]
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Self {
                self.map_err(|mut err| {
                    match &mut err {
                        #( #arms )*
                        _ => {}
                    }
                    err
                })
            }
        }
    }
}

fn source_conversion(
    name: &Ident,
    ext_trait: &Ident,
    plan: &VariantPlan<'_>,
) -> Option<TokenStream> {
    if plan.ident == "Internal" {
        return None;
    }
    let (field, ty) = plan.source?;
    let ident = plan.ident;
    let cfg_attrs = &plan.cfg_attrs;

    Some(quote! {
        #(#cfg_attrs)*
        #[automatically_derived]
        impl From<#ty> for #name {
            #[inline]
            fn from(#field: #ty) -> Self { Self::#ident { #field, context: None } }
        }

        #(#cfg_attrs)*
        impl<T> #ext_trait<T> for std::result::Result<T, #ty> {
            #[inline]
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> std::result::Result<T, #name> {
                self.map_err(|#field| #name::#ident { #field, context: Some(context.into()) })
            }
        }
    })
}

/// `From<&'static str>` / `From<String>` for an `Internal { message, context }` variant.
fn message_conversions(name: &Ident, plans: &[VariantPlan<'_>]) -> TokenStream {
    let Some(internal) = plans.iter().find(|p| p.ident == "Internal" && p.has_message) else {
        return quote!();
    };
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

/// `kind()` returns the variant name, used as a stable label in logs and warning lists.
fn kind_accessor(name: &Ident, plans: &[VariantPlan<'_>]) -> TokenStream {
    let arms = plans.iter().map(|p| {
        let cfg_attrs = &p.cfg_attrs;
        let ident = p.ident;
        let label = ident.to_string();
        quote! { #(#cfg_attrs)* Self::#ident { .. } => #label, }
    });

    quote! {
        #[automatically_derived]
        impl #name {
            #[must_use]
            pub const fn kind(&self) -> &'static str {
                match self {
                    #( #arms )*
                }
            }
        }
    }
}

fn derived_traits(input: &DeriveInput) -> FxHashSet<String> {
    let mut traits = FxHashSet::default();

    for attr in input.attrs.iter().filter(|a| a.path().is_ident("derive")) {
        let _ = attr.parse_nested_meta(|meta| {
            if let Some(seg) = meta.path.segments.last() {
                traits.insert(seg.ident.to_string());
            }
            Ok(())
        });
    }

    traits
}

fn missing_context_error(plans: &[VariantPlan<'_>]) -> Option<TokenStream> {
    plans.iter().find(|p| p.source.is_some() && !p.has_context).map(|p| {
        syn::Error::new_spanned(
            p.ident,
            "casefile_error requires `context: Option<Cow<'static, str>>` next to a source field",
        )
        .to_compile_error()
    })
}

/// Matches `Option<Cow<'static, str>>` by path tail, so fully qualified spellings also pass.
fn is_optional_static_cow(ty: &Type) -> bool {
    let Some(inner) = single_generic(ty, "Option") else {
        return false;
    };
    let Type::Path(path) = inner else {
        return false;
    };
    let Some(segment) = path.path.segments.last() else {
        return false;
    };
    if segment.ident != "Cow" {
        return false;
    }
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return false;
    };
    let mut args = args.args.iter();
    let Some(syn::GenericArgument::Lifetime(lt)) = args.next() else {
        return false;
    };
    let Some(syn::GenericArgument::Type(Type::Path(target))) = args.next() else {
        return false;
    };
    lt.ident == "static" && target.path.segments.last().is_some_and(|s| s.ident == "str")
}

fn single_generic<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        syn::GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}
