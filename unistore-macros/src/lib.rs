//! Procedural macros for unistore

use darling::{FromDeriveInput, FromField, FromVariant};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use std::collections::HashMap;
use syn::{parse_macro_input, DeriveInput};

/// Container for #[derive(Injectable)]
#[derive(Debug, FromDeriveInput)]
#[darling(supports(struct_any))]
struct InjectableOpts {
    ident: syn::Ident,
    generics: syn::Generics,
    data: darling::ast::Data<(), InjectableField>,
}

/// Field-level `#[inject]` attributes are forwarded and parsed by hand so that
/// both the bare form and `#[inject(nested)]` are accepted.
#[derive(Debug, FromField)]
#[darling(forward_attrs(inject))]
struct InjectableField {
    ident: Option<syn::Ident>,
    attrs: Vec<syn::Attribute>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InjectMode {
    /// Resolve the field itself (an `Injected` or `Projected` slot)
    Slot,
    /// Descend into the field and inject whatever it holds
    Nested,
}

fn inject_mode(attrs: &[syn::Attribute]) -> syn::Result<Option<InjectMode>> {
    let mut mode = None;
    for attr in attrs {
        if mode.is_some() {
            return Err(syn::Error::new_spanned(
                attr,
                "duplicate #[inject] attribute",
            ));
        }
        match &attr.meta {
            syn::Meta::Path(_) => mode = Some(InjectMode::Slot),
            syn::Meta::List(_) => {
                let mut nested = false;
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("nested") {
                        nested = true;
                        Ok(())
                    } else {
                        Err(meta.error("expected `nested`"))
                    }
                })?;
                mode = Some(if nested {
                    InjectMode::Nested
                } else {
                    InjectMode::Slot
                });
            }
            syn::Meta::NameValue(_) => {
                return Err(syn::Error::new_spanned(
                    attr,
                    "expected #[inject] or #[inject(nested)]",
                ));
            }
        }
    }
    Ok(mode)
}

/// Derive macro for the Injectable trait
///
/// Fields marked `#[inject]` are slots (`Injected<K>` or `Projected<V>`)
/// resolved from the environment. Fields marked `#[inject(nested)]` are
/// descended into: any `Injectable` value, including `Rc`, `RefCell`,
/// `Option` and `Vec` of injectable values. Unmarked fields are ignored.
/// Fields are visited in declaration order.
///
/// # Example
/// ```ignore
/// #[derive(Injectable)]
/// struct SyncService {
///     #[inject]
///     base_url: Injected<ApiBaseUrl>,
///     #[inject(nested)]
///     client: Rc<HttpClient>,
///     store: StoreSlot<AppState, AppCommand>,
/// }
/// ```
#[proc_macro_derive(Injectable, attributes(inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match InjectableOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors().into(),
    };

    let name = &opts.ident;
    let (impl_generics, ty_generics, where_clause) = opts.generics.split_for_impl();

    let fields = match &opts.data {
        darling::ast::Data::Struct(fields) => fields,
        _ => {
            return syn::Error::new_spanned(&input, "Injectable can only be derived for structs")
                .to_compile_error()
                .into();
        }
    };

    let mut visits: Vec<TokenStream2> = Vec::new();
    for (index, field) in fields.iter().enumerate() {
        let mode = match inject_mode(&field.attrs) {
            Ok(Some(mode)) => mode,
            Ok(None) => continue,
            Err(e) => return e.to_compile_error().into(),
        };

        let access = match &field.ident {
            Some(ident) => quote! { self.#ident },
            None => {
                let index = syn::Index::from(index);
                quote! { self.#index }
            }
        };

        visits.push(match mode {
            InjectMode::Slot => quote! {
                unistore::inject::Injectable::inject(&#access, injector);
            },
            InjectMode::Nested => quote! {
                injector.descend(&#access);
            },
        });
    }

    let injector_ident = if visits.is_empty() {
        quote! { _injector }
    } else {
        quote! { injector }
    };

    let expanded = quote! {
        impl #impl_generics unistore::inject::Injectable for #name #ty_generics #where_clause {
            fn inject(&self, #injector_ident: &mut unistore::inject::Injector<'_>) {
                #(#visits)*
            }
        }
    };

    TokenStream::from(expanded)
}

/// Container for #[derive(CommandSet)]
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(command), supports(enum_any))]
struct CommandSetOpts {
    ident: syn::Ident,
    generics: syn::Generics,
    data: darling::ast::Data<CommandVariant, ()>,
}

/// Variant-level attributes
#[derive(Debug, FromVariant)]
#[darling(attributes(command))]
struct CommandVariant {
    ident: syn::Ident,
    fields: darling::ast::Fields<CommandField>,

    /// Do not generate a route for this variant
    #[darling(default)]
    skip: bool,
}

#[derive(Debug, FromField)]
struct CommandField {
    ty: syn::Type,
}

/// Derive macro for the CommandRoute trait
///
/// Every variant of the form `Variant(Inner)` becomes a route: the enum
/// implements `CommandRoute<Inner>`, so services written for `Inner` can be
/// registered through `CommandAdapter::routed`. Each wrapped type may appear
/// in one variant only. Unit variants and variants marked `#[command(skip)]`
/// get no route.
///
/// # Example
/// ```ignore
/// #[derive(CommandSet, Debug, Clone)]
/// enum AppCommand {
///     Auth(AuthCommand),
///     Sync(SyncCommand),
///     #[command(skip)]
///     Quit,
/// }
///
/// let command = AppCommand::embed(AuthCommand::LoggedIn);
/// assert!(CommandRoute::<AuthCommand>::extract(&command).is_some());
/// ```
#[proc_macro_derive(CommandSet, attributes(command))]
pub fn derive_command_set(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let opts = match CommandSetOpts::from_derive_input(&input) {
        Ok(opts) => opts,
        Err(e) => return e.write_errors().into(),
    };

    let name = &opts.ident;
    let (impl_generics, ty_generics, where_clause) = opts.generics.split_for_impl();

    let variants = match &opts.data {
        darling::ast::Data::Enum(variants) => variants,
        _ => {
            return syn::Error::new_spanned(&input, "CommandSet can only be derived for enums")
                .to_compile_error()
                .into();
        }
    };

    // Two routes to the same type would be conflicting impls
    let mut seen: HashMap<String, &syn::Ident> = HashMap::new();
    let mut routes: Vec<TokenStream2> = Vec::new();

    for variant in variants {
        if variant.skip || matches!(variant.fields.style, darling::ast::Style::Unit) {
            continue;
        }

        let variant_name = &variant.ident;
        let inner = match (&variant.fields.style, variant.fields.fields.as_slice()) {
            (darling::ast::Style::Tuple, [field]) => &field.ty,
            _ => {
                return syn::Error::new_spanned(
                    variant_name,
                    "CommandSet variants must wrap exactly one command: `Variant(Inner)`; \
                     use #[command(skip)] to exclude others",
                )
                .to_compile_error()
                .into();
            }
        };

        let key = quote!(#inner).to_string();
        if let Some(previous) = seen.insert(key, variant_name) {
            return syn::Error::new_spanned(
                variant_name,
                format!(
                    "`{}` wraps the same type as `{}`; mark one of them #[command(skip)]",
                    variant_name, previous
                ),
            )
            .to_compile_error()
            .into();
        }

        routes.push(quote! {
            impl #impl_generics unistore::adapter::CommandRoute<#inner> for #name #ty_generics #where_clause {
                fn extract(&self) -> ::core::option::Option<&#inner> {
                    match self {
                        #name::#variant_name(inner) => ::core::option::Option::Some(inner),
                        #[allow(unreachable_patterns)]
                        _ => ::core::option::Option::None,
                    }
                }

                fn embed(small: #inner) -> Self {
                    #name::#variant_name(small)
                }
            }
        });
    }

    let expanded = quote! {
        #(#routes)*
    };

    TokenStream::from(expanded)
}
