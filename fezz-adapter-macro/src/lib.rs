//! Procedural macros for fezz-adapter actions.
//!
//! This crate provides the `#[fezz_action]` attribute macro, which turns a plain async
//! function into a type implementing `fezz_adapter::function::Action`.
//!
//! # Example
//!
//! ```ignore
//! use fezz_adapter::prelude::*;
//!
//! #[fezz_action(name = "hello")]
//! async fn hello(req: ActionRequest, ctx: &ActionContext) -> Result<ActionResponse, ActionError> {
//!     Ok(ActionResponse::text(format!("Hello from {}", ctx.func.name)))
//! }
//!
//! // `HelloAction` now implements `Action`.
//! ```

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, punctuated::Punctuated, Expr, ExprLit, FnArg, ItemFn, Lit, Meta, Token,
};

/// Attributes for the `#[fezz_action]` macro.
#[derive(Default, Debug)]
struct FezzActionAttrs {
    /// Name used in logs.
    name: Option<String>,
}

impl FezzActionAttrs {
    fn parse_meta_list(metas: Punctuated<Meta, Token![,]>) -> syn::Result<Self> {
        let mut attrs = FezzActionAttrs::default();

        for meta in metas {
            let nv = match meta {
                Meta::NameValue(nv) => nv,
                other => return Err(syn::Error::new_spanned(other, "expected name = value")),
            };
            let ident = nv
                .path
                .get_ident()
                .ok_or_else(|| syn::Error::new_spanned(&nv.path, "expected identifier"))?
                .to_string();

            match (ident.as_str(), &nv.value) {
                ("name", Expr::Lit(ExprLit { lit: Lit::Str(lit_str), .. })) => {
                    attrs.name = Some(lit_str.value());
                }
                ("name", other) => {
                    return Err(syn::Error::new_spanned(other, "name must be a string literal"));
                }
                _ => {
                    return Err(syn::Error::new_spanned(
                        nv.path,
                        format!("unknown attribute: {}", ident),
                    ));
                }
            }
        }

        Ok(attrs)
    }
}

/// The `#[fezz_action]` attribute macro.
///
/// Generates a unit struct named `<PascalCaseFn>Action` implementing `Action` that
/// forwards to the annotated function. The function itself is kept unchanged.
///
/// # Attributes
///
/// - `name` (optional): name used in logs, defaults to the function name
#[proc_macro_attribute]
pub fn fezz_action(args: TokenStream, input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(args with Punctuated::<Meta, Token![,]>::parse_terminated);
    let input_fn = parse_macro_input!(input as ItemFn);

    match generate_fezz_action(args, input_fn) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn generate_fezz_action(
    args: Punctuated<Meta, Token![,]>,
    input_fn: ItemFn,
) -> syn::Result<proc_macro2::TokenStream> {
    let attrs = FezzActionAttrs::parse_meta_list(args)?;

    if input_fn.sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(
            &input_fn.sig,
            "fezz_action must be async",
        ));
    }
    let typed_args = input_fn
        .sig
        .inputs
        .iter()
        .filter(|arg| matches!(arg, FnArg::Typed(_)))
        .count();
    if typed_args != 2 || input_fn.sig.inputs.len() != 2 {
        return Err(syn::Error::new_spanned(
            &input_fn.sig.inputs,
            "fezz_action expects (ActionRequest, &ActionContext)",
        ));
    }

    let fn_name = &input_fn.sig.ident;
    let action_name = attrs.name.unwrap_or_else(|| fn_name.to_string());
    let struct_name = format_ident!("{}Action", to_pascal_case(&fn_name.to_string()));
    let fn_vis = &input_fn.vis;

    let expanded = quote! {
        /// Generated action type.
        #[derive(Debug, Default, Clone, Copy)]
        #fn_vis struct #struct_name;

        impl #struct_name {
            /// Create a new instance of the action.
            pub fn new() -> Self {
                Self
            }
        }

        #[::fezz_adapter::prelude::async_trait]
        impl ::fezz_adapter::function::Action for #struct_name {
            async fn run(
                &self,
                request: ::fezz_adapter::http::ActionRequest,
                ctx: &::fezz_adapter::function::ActionContext,
            ) -> ::std::result::Result<
                ::fezz_adapter::http::ActionResponse,
                ::fezz_adapter::function::ActionError,
            > {
                #fn_name(request, ctx).await
            }

            fn name(&self) -> &str {
                #action_name
            }
        }

        #input_fn
    };

    Ok(expanded)
}

/// Convert a snake_case string to PascalCase.
fn to_pascal_case(s: &str) -> String {
    s.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect()
}
