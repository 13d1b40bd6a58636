//! Proc macros for `doc-migrate`.
//!
//! - **`#[migration]`**: attribute macro that turns a typed migration
//!   function into a `MigrationStep` constructor usable with any codec.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, punctuated::Punctuated, token::Comma, ItemFn, Meta, Type};

/// Attribute macro that lifts a migration function into a `MigrationStep`.
///
/// The function must take a single argument (the old record) and return
/// either the new record or a `Result<New, E>` where `E: Into<MigrateError>`.
/// The old record must implement `doc_migrate::Record`
/// (`Default + Serialize + DeserializeOwned`), the new one `Serialize`.
/// The function must be a plain synchronous, safe Rust `fn`.
///
/// Optional argument: `name = "..."`, the step name used in diagnostics.
/// Defaults to the function name.
///
/// The function is kept as written. Next to it, a `{fn_name}_step` function
/// with the same visibility is generated:
///
/// ```ignore
/// fn {fn_name}_step<C: doc_migrate::Codec>() -> doc_migrate::MigrationStep<C>
/// ```
///
/// The step decodes the old record, calls your function, and encodes the
/// result, so one function serves both JSON and BSON chains.
///
/// ```ignore
/// use doc_migrate::{json::JsonMigrator, migration};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Default, Serialize, Deserialize)]
/// struct ProfileV1 { handle: String }
///
/// #[derive(Default, Serialize, Deserialize)]
/// struct ProfileV2 { handle: String, verified: bool }
///
/// #[migration(name = "v1_to_v2")]
/// fn add_verified(old: ProfileV1) -> ProfileV2 {
///     ProfileV2 { handle: old.handle, verified: false }
/// }
///
/// let profiles: JsonMigrator<ProfileV2> = JsonMigrator::builder()
///     .step(add_verified_step())
///     .build();
/// ```
#[proc_macro_attribute]
pub fn migration(attr: TokenStream, item: TokenStream) -> TokenStream {
    let func = parse_macro_input!(item as ItemFn);
    let args = parse_macro_input!(attr with Punctuated::<Meta, Comma>::parse_terminated);

    expand(&func, &args)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(func: &ItemFn, args: &Punctuated<Meta, Comma>) -> syn::Result<proc_macro2::TokenStream> {
    let fn_name = &func.sig.ident;
    let step_name = configured_name(args)?.unwrap_or_else(|| fn_name.to_string());
    let (old, new) = record_types(func)?;

    let transform = if returns_result(new) {
        quote! { #fn_name }
    } else {
        quote! {
            |old: #old| ::core::result::Result::<#new, ::doc_migrate::MigrateError>::Ok(#fn_name(old))
        }
    };

    let vis = &func.vis;
    let step_fn = format_ident!("{}_step", fn_name);
    let doc = format!("Migration step running [`{fn_name}`].");

    Ok(quote! {
        #func

        #[doc = #doc]
        #vis fn #step_fn<C: ::doc_migrate::Codec>() -> ::doc_migrate::MigrationStep<C> {
            ::doc_migrate::MigrationStep::typed(#step_name, #transform)
        }
    })
}

/// The `name = "..."` argument, if given.
fn configured_name(args: &Punctuated<Meta, Comma>) -> syn::Result<Option<String>> {
    let mut name = None;
    for meta in args {
        let Meta::NameValue(pair) = meta else {
            return Err(syn::Error::new_spanned(meta, "expected `name = \"...\"`"));
        };
        if !pair.path.is_ident("name") {
            return Err(syn::Error::new_spanned(
                &pair.path,
                "unknown argument, only `name` is supported",
            ));
        }
        match &pair.value {
            syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Str(lit),
                ..
            }) => name = Some(lit.value()),
            other => return Err(syn::Error::new_spanned(other, "`name` must be a string literal")),
        }
    }
    Ok(name)
}

/// The old and new record types of a `fn(old: Old) -> New` signature.
fn record_types(func: &ItemFn) -> syn::Result<(&Type, &Type)> {
    let sig = &func.sig;
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "a migration function cannot be generic",
        ));
    }
    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "a migration function cannot be async",
        ));
    }
    if let Some(unsafety) = &sig.unsafety {
        return Err(syn::Error::new_spanned(
            unsafety,
            "a migration function cannot be unsafe",
        ));
    }
    if let Some(constness) = &sig.constness {
        return Err(syn::Error::new_spanned(
            constness,
            "a migration function cannot be const",
        ));
    }
    if let Some(abi) = &sig.abi {
        return Err(syn::Error::new_spanned(
            abi,
            "a migration function must use the Rust ABI",
        ));
    }

    let mut inputs = sig.inputs.iter();
    let old = match (inputs.next(), inputs.next()) {
        (Some(syn::FnArg::Typed(arg)), None) => &*arg.ty,
        _ => {
            return Err(syn::Error::new_spanned(
                &sig.inputs,
                "a migration function takes the old record as its only argument",
            ))
        }
    };

    let new = match &sig.output {
        syn::ReturnType::Type(_, ty) => &**ty,
        syn::ReturnType::Default => {
            return Err(syn::Error::new_spanned(
                sig,
                "a migration function must return the new record",
            ))
        }
    };

    Ok((old, new))
}

/// Whether a return type is spelled as some `Result<..>`.
fn returns_result(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Result"),
        _ => false,
    }
}
