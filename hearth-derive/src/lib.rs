//! Custom derive macro for the [`Component`][component] trait.
//!
//! [component]: https://docs.rs/hearth-ecs/latest/hearth_ecs/component/trait.Component.html
//!
//! ```rust,ignore
//! #[derive(Component, Debug, Clone, PartialEq)]
//! struct Position(f32, f32, f32);
//!
//! #[derive(Component)]
//! #[component(fixed)]
//! struct PlayerTag;
//!
//! #[derive(Component)]
//! #[component(page_size = 64)]
//! struct RareEffect;
//! ```
//!
//! Both `#[component(...)]` keys may appear together, separated by a comma.
//! Omitting the attribute entirely derives the trait's defaults
//! (`PAGE_SIZE` = 1024, `FIXED` = false).

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput, Expr};

#[proc_macro_derive(Component, attributes(component))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    match expand(&ast) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(ast: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let mut page_size: Option<Expr> = None;
    let mut fixed = false;

    for attr in &ast.attrs {
        if !attr.path().is_ident("component") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("fixed") {
                fixed = true;
                Ok(())
            } else if meta.path.is_ident("page_size") {
                let value = meta.value()?;
                page_size = Some(value.parse()?);
                Ok(())
            } else {
                Err(meta.error(
                    "unsupported `component` attribute key, expected `fixed` or `page_size = N`",
                ))
            }
        })?;
    }

    let page_size_item =
        page_size.map(|expr| quote! { const PAGE_SIZE: usize = #expr; });
    let fixed_item = fixed.then(|| quote! { const FIXED: bool = true; });

    Ok(quote! {
        impl #impl_generics ::hearth_ecs::component::Component for #name #ty_generics #where_clause {
            #page_size_item
            #fixed_item
        }
    })
}
