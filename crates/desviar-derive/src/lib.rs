//! Desviar derive macros: compile-time step wrappers for page objects.
//!
//! Decorator-style step naming needs the page object's type name at the call
//! site. A statically-typed language cannot reflect it at runtime, so the
//! wrapper is generated at compile time instead: `#[page_steps]` on an impl
//! block sees the self type, derives the step label, and rewraps each marked
//! method's body.
//!
//! ```ignore
//! use desviar_derive::page_steps;
//!
//! struct ConduitPage { /* ... */ }
//!
//! #[page_steps]
//! impl ConduitPage {
//!     // Runs as step "Conduit.login"; failures inside are attributed to
//!     // the outer step (boxed semantics).
//!     #[boxed_step]
//!     async fn login(&self) -> desviar::DesviarResult<()> {
//!         // ...
//!         Ok(())
//!     }
//!
//!     // Runs as step "Conduit.open"; plain labeling.
//!     #[step]
//!     async fn open(&self) -> desviar::DesviarResult<()> {
//!         Ok(())
//!     }
//! }
//! ```
//!
//! The step label is the impl target's type name with a trailing
//! `PageObject` or `Page` suffix stripped, joined with the method name.
//! Generated code calls `desviar::step::run_step` /
//! `desviar::step::run_boxed_step`, so consumers need `desviar` as a
//! dependency. Marked methods must be `async` and return a `Result`.

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{parse_macro_input, parse_quote, Ident, ImplItem, ImplItemFn, ItemImpl, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepKind {
    Plain,
    Boxed,
}

/// Attribute macro generating named step wrappers for an impl block.
///
/// Methods marked `#[step]` or `#[boxed_step]` are rewrapped; unmarked
/// methods are left untouched. The marker attributes are consumed here and
/// never reach the compiler.
#[proc_macro_attribute]
pub fn page_steps(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut item_impl = parse_macro_input!(item as ItemImpl);

    let Some(label) = type_label(&item_impl.self_ty) else {
        return syn::Error::new_spanned(
            &item_impl.self_ty,
            "#[page_steps] requires an impl block for a named type",
        )
        .to_compile_error()
        .into();
    };

    for item in &mut item_impl.items {
        let ImplItem::Fn(method) = item else {
            continue;
        };
        match take_step_kind(method) {
            Ok(Some(kind)) => {
                if method.sig.asyncness.is_none() {
                    return syn::Error::new_spanned(
                        &method.sig.ident,
                        "step methods must be async",
                    )
                    .to_compile_error()
                    .into();
                }
                wrap_method(method, &label, kind);
            }
            Ok(None) => {}
            Err(error) => return error.to_compile_error().into(),
        }
    }

    quote!(#item_impl).into()
}

/// Derive the step label from the impl target's type name.
///
/// `ConduitPage` and `ConduitPageObject` both label steps `Conduit.*`; a
/// name without the suffix is used as-is.
fn type_label(ty: &Type) -> Option<String> {
    let Type::Path(path) = ty else {
        return None;
    };
    let ident = path.path.segments.last()?.ident.to_string();
    let label = ident
        .strip_suffix("PageObject")
        .or_else(|| ident.strip_suffix("Page"))
        .unwrap_or(&ident);
    if label.is_empty() {
        Some(ident.clone())
    } else {
        Some(label.to_string())
    }
}

/// Find and consume a method's step marker, if any.
fn take_step_kind(method: &mut ImplItemFn) -> syn::Result<Option<StepKind>> {
    let mut kind = None;
    let mut remaining = Vec::with_capacity(method.attrs.len());
    for attr in method.attrs.drain(..) {
        let marker = if attr.path().is_ident("step") {
            Some(StepKind::Plain)
        } else if attr.path().is_ident("boxed_step") {
            Some(StepKind::Boxed)
        } else {
            None
        };
        match marker {
            Some(new) => {
                if kind.is_some() {
                    return Err(syn::Error::new_spanned(
                        &attr,
                        "a method can carry only one step attribute",
                    ));
                }
                kind = Some(new);
            }
            None => remaining.push(attr),
        }
    }
    method.attrs = remaining;
    Ok(kind)
}

/// Rewrap a method body to run inside the step runtime.
fn wrap_method(method: &mut ImplItemFn, label: &str, kind: StepKind) {
    let step_name = format!("{label}.{}", method.sig.ident);
    let runner = Ident::new(
        match kind {
            StepKind::Plain => "run_step",
            StepKind::Boxed => "run_boxed_step",
        },
        Span::call_site(),
    );
    let body = &method.block;
    let wrapped: syn::Block = parse_quote!({
        ::desviar::step::#runner(#step_name, async move #body).await
    });
    method.block = wrapped;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse_type(source: &str) -> Type {
        syn::parse_str(source).unwrap()
    }

    fn parse_method(source: &str) -> ImplItemFn {
        syn::parse_str(source).unwrap()
    }

    mod type_label_tests {
        use super::*;

        #[test]
        fn test_strips_page_suffix() {
            assert_eq!(type_label(&parse_type("ConduitPage")).unwrap(), "Conduit");
        }

        #[test]
        fn test_strips_page_object_suffix() {
            assert_eq!(
                type_label(&parse_type("ConduitPageObject")).unwrap(),
                "Conduit"
            );
        }

        #[test]
        fn test_unsuffixed_name_used_as_is() {
            assert_eq!(type_label(&parse_type("Checkout")).unwrap(), "Checkout");
        }

        #[test]
        fn test_bare_page_keeps_full_name() {
            assert_eq!(type_label(&parse_type("Page")).unwrap(), "Page");
        }

        #[test]
        fn test_qualified_path_uses_last_segment() {
            assert_eq!(
                type_label(&parse_type("pages::ConduitPage")).unwrap(),
                "Conduit"
            );
        }

        #[test]
        fn test_non_path_type_is_rejected() {
            assert!(type_label(&parse_type("(u8, u8)")).is_none());
        }
    }

    mod take_step_kind_tests {
        use super::*;

        #[test]
        fn test_step_marker_is_consumed() {
            let mut method = parse_method("#[step] async fn open(&self) -> R { todo!() }");
            let kind = take_step_kind(&mut method).unwrap();
            assert_eq!(kind, Some(StepKind::Plain));
            assert!(method.attrs.is_empty());
        }

        #[test]
        fn test_boxed_marker_is_consumed() {
            let mut method = parse_method("#[boxed_step] async fn login(&self) -> R { todo!() }");
            let kind = take_step_kind(&mut method).unwrap();
            assert_eq!(kind, Some(StepKind::Boxed));
        }

        #[test]
        fn test_unmarked_method_is_untouched() {
            let mut method =
                parse_method("#[allow(dead_code)] async fn other(&self) -> R { todo!() }");
            let kind = take_step_kind(&mut method).unwrap();
            assert_eq!(kind, None);
            assert_eq!(method.attrs.len(), 1);
        }

        #[test]
        fn test_double_marker_is_an_error() {
            let mut method =
                parse_method("#[step] #[boxed_step] async fn both(&self) -> R { todo!() }");
            assert!(take_step_kind(&mut method).is_err());
        }
    }

    mod wrap_method_tests {
        use super::*;
        use quote::ToTokens;

        #[test]
        fn test_wrapped_body_calls_runner_with_name() {
            let mut method = parse_method("async fn login(&self) -> R { self.inner().await }");
            wrap_method(&mut method, "Conduit", StepKind::Boxed);
            let rendered = method.to_token_stream().to_string();
            assert!(rendered.contains("run_boxed_step"));
            assert!(rendered.contains("Conduit.login"));
            assert!(rendered.contains("async move"));
        }

        #[test]
        fn test_plain_wrapper_uses_run_step() {
            let mut method = parse_method("async fn open(&self) -> R { todo!() }");
            wrap_method(&mut method, "Checkout", StepKind::Plain);
            let rendered = method.to_token_stream().to_string();
            assert!(rendered.contains("run_step"));
            assert!(!rendered.contains("run_boxed_step"));
        }
    }
}
