use proc_macro2::TokenStream;
use quote::{format_ident, quote};

mod attr;
mod method;
mod output;
mod trait_info;

pub use attr::Attr;

use attr::{is_double_attr, Access};
use trait_info::TraitInfo;

pub fn generate(attr: Attr, item_trait: syn::ItemTrait) -> syn::Result<TokenStream> {
    let prefix = attr.prefix();
    let trait_info = TraitInfo::analyze(&item_trait, &attr)?;

    let output_trait = strip_helper_attrs(&item_trait);
    let double_def = def_double(&prefix, &trait_info);
    let capability = def_capability(&prefix, &trait_info);
    let trait_impl = def_trait_impl(&prefix, &trait_info);
    let from_value = def_from_value(&prefix, &trait_info);
    let partial = if trait_info.partial {
        def_partial(&prefix, &trait_info)
    } else {
        quote! {}
    };

    Ok(quote! {
        #output_trait
        #double_def
        const _: () = {
            #capability
            #trait_impl
            #from_value
        };
        #partial
    })
}

fn strip_helper_attrs(item_trait: &syn::ItemTrait) -> syn::ItemTrait {
    let mut item_trait = item_trait.clone();
    for item in item_trait.items.iter_mut() {
        if let syn::TraitItem::Fn(method) = item {
            method.attrs.retain(|attr| !is_double_attr(attr));
        }
    }
    item_trait
}

fn def_double(prefix: &syn::Path, trait_info: &TraitInfo) -> TokenStream {
    let vis = &trait_info.input_trait.vis;
    let double_ident = &trait_info.double_ident;
    let doc = format!("Test double implementing `{}`.", trait_info.trait_ident());

    quote! {
        #[doc = #doc]
        #[derive(Clone, Debug)]
        #vis struct #double_ident(#prefix::Double);

        impl ::std::ops::Deref for #double_ident {
            type Target = #prefix::Double;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
    }
}

fn def_capability(prefix: &syn::Path, trait_info: &TraitInfo) -> TokenStream {
    let double_ident = &trait_info.double_ident;
    let type_name = trait_info.trait_ident().to_string();
    let accessible = trait_info.accessible;
    let constructor = if trait_info.partial {
        quote! { #prefix::Capability::class(#type_name) }
    } else {
        quote! { #prefix::Capability::interface(#type_name) }
    };

    let methods = trait_info
        .methods
        .iter()
        .filter(|method| !method.is_property())
        .map(|method| {
            let member = &method.member;
            let params = method.params.iter().map(|param| {
                let value_type = param.value_type();
                quote! { <#value_type as #prefix::FromValue>::declared() }
            });
            let returns = method.output_structure.value_type();
            let sealed = method.sealed.then(|| quote! { .sealed() });
            quote! {
                .member(
                    #prefix::Member::method(
                        #member,
                        [#(#params),*],
                        <#returns as #prefix::FromValue>::declared(),
                    )
                    #sealed
                )
            }
        });

    let properties = trait_info.property_names().into_iter().map(|name| {
        let accessors: Vec<_> = trait_info.accessors(name).collect();
        let getter = accessors
            .iter()
            .find(|method| matches!(method.access, Access::Get(_)));
        let setter = accessors
            .iter()
            .find(|method| matches!(method.access, Access::Set(_)));
        let ty = match (getter, setter.and_then(|setter| setter.params.first())) {
            (Some(getter), _) => getter.output_structure.value_type(),
            (None, Some(param)) => param.value_type(),
            (None, None) => quote! { () },
        };
        let read_only = setter.is_none().then(|| quote! { .read_only() });
        let write_only = getter.is_none().then(|| quote! { .write_only() });
        let sealed = accessors
            .iter()
            .any(|method| method.sealed)
            .then(|| quote! { .sealed() });
        quote! {
            .member(
                #prefix::Member::property(#name, <#ty as #prefix::FromValue>::declared())
                #read_only
                #write_only
                #sealed
            )
        }
    });

    quote! {
        impl #prefix::Fake for #double_ident {
            fn capability() -> #prefix::Capability {
                static CAPABILITY: #prefix::macro_api::OnceCell<#prefix::Capability> =
                    #prefix::macro_api::OnceCell::new();
                CAPABILITY
                    .get_or_init(|| {
                        #constructor
                            #(#methods)*
                            #(#properties)*
                            .accessible(#accessible)
                            .build()
                    })
                    .clone()
            }

            fn from_double(double: #prefix::Double) -> Self {
                Self(double)
            }

            fn double(&self) -> &#prefix::Double {
                &self.0
            }
        }
    }
}

fn def_trait_impl(prefix: &syn::Path, trait_info: &TraitInfo) -> TokenStream {
    let trait_ident = trait_info.trait_ident();
    let double_ident = &trait_info.double_ident;

    let methods = trait_info.methods.iter().map(|method| {
        let sig = method.signature();
        let call = method.call_signature(prefix);
        let body = method
            .output_structure
            .eval(prefix, quote! { &self.0 }, call);
        quote! {
            #[track_caller]
            #sig {
                #body
            }
        }
    });

    quote! {
        impl #trait_ident for #double_ident {
            #(#methods)*
        }
    }
}

fn def_from_value(prefix: &syn::Path, trait_info: &TraitInfo) -> TokenStream {
    let trait_ident = trait_info.trait_ident();
    let double_ident = &trait_info.double_ident;
    let type_name = trait_ident.to_string();

    quote! {
        impl #prefix::FromValue for ::std::boxed::Box<dyn #trait_ident> {
            fn declared() -> #prefix::ValueType {
                #prefix::ValueType::object(
                    #type_name,
                    <#double_ident as #prefix::Fake>::capability,
                )
            }

            fn from_value(value: #prefix::Value) -> ::std::result::Result<Self, #prefix::Failure> {
                match value {
                    #prefix::Value::Double(double) if double.type_name() == #type_name => {
                        ::std::result::Result::Ok(::std::boxed::Box::new(
                            <#double_ident as #prefix::Fake>::from_double(double),
                        ))
                    }
                    // a trait object cannot be absent, so null stands for a fresh double
                    #prefix::Value::Null => #prefix::Double::new(
                        <#double_ident as #prefix::Fake>::capability(),
                    )
                    .map(|double| {
                        ::std::boxed::Box::new(<#double_ident as #prefix::Fake>::from_double(double))
                            as ::std::boxed::Box<dyn #trait_ident>
                    }),
                    other => ::std::result::Result::Err(
                        #prefix::Failure::type_mismatch(#type_name, &other),
                    ),
                }
            }
        }
    }
}

fn def_partial(prefix: &syn::Path, trait_info: &TraitInfo) -> TokenStream {
    let vis = &trait_info.input_trait.vis;
    let trait_ident = trait_info.trait_ident();
    let double_ident = &trait_info.double_ident;
    let base_ident = format_ident!("{}Base", double_ident);
    let type_name = trait_ident.to_string();
    let arms = trait_info
        .methods
        .iter()
        .map(|method| method.base_arm(prefix, trait_ident));
    let doc = format!("Forwards calls on a partial `{double_ident}` to a real `{trait_ident}`.");

    quote! {
        #[doc = #doc]
        #vis struct #base_ident<T>(pub T);

        impl<T: #trait_ident + ::std::marker::Send> #prefix::Base for #base_ident<T> {
            fn dispatch(
                &mut self,
                call: &#prefix::CallSignature,
            ) -> ::std::result::Result<#prefix::Value, #prefix::Failure> {
                match (call.kind(), call.member()) {
                    #(#arms)*
                    _ => ::std::result::Result::Err(
                        #prefix::macro_api::unknown_member(#type_name, call),
                    ),
                }
            }
        }

        impl #double_ident {
            /// Builder of a double delegating to `real` for sealed members and
            /// for calls resolved with `CallBase`.
            pub fn partial<T>(real: T) -> #prefix::DoubleBuilder
            where
                T: #trait_ident + ::std::marker::Send + 'static,
            {
                #prefix::Double::builder(<Self as #prefix::Fake>::capability())
                    .base(#base_ident(real))
            }
        }
    }
}
