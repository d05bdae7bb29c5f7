use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use super::attr::{Access, MethodAttr};
use super::output::OutputStructure;

pub struct MockMethod<'t> {
    pub method: &'t syn::TraitItemFn,
    pub member: String,
    pub access: Access,
    pub sealed: bool,
    pub mutable_receiver: bool,
    pub params: Vec<Param>,
    pub output_structure: OutputStructure,
}

pub struct Param {
    pub ident: syn::Ident,
    pub ty: syn::Type,
    /// Parameter taken by shared reference; the double records an owned copy.
    pub borrowed: bool,
}

impl Param {
    /// The owned type the argument travels as.
    pub fn value_type(&self) -> TokenStream {
        let ty = &self.ty;
        if self.borrowed {
            quote! { <#ty as ::std::borrow::ToOwned>::Owned }
        } else {
            quote! { #ty }
        }
    }

    pub fn into_value(&self, prefix: &syn::Path) -> TokenStream {
        let ident = &self.ident;
        if self.borrowed {
            quote! { #prefix::IntoValue::into_value(::std::borrow::ToOwned::to_owned(#ident)) }
        } else {
            quote! { #prefix::IntoValue::into_value(#ident) }
        }
    }
}

pub fn extract_methods(input_trait: &syn::ItemTrait) -> syn::Result<Vec<MockMethod<'_>>> {
    input_trait
        .items
        .iter()
        .map(|item| match item {
            syn::TraitItem::Fn(method) => MockMethod::analyze(method),
            other => Err(syn::Error::new_spanned(
                other,
                "#[double] only supports trait methods, not associated items",
            )),
        })
        .collect()
}

impl<'t> MockMethod<'t> {
    fn analyze(method: &'t syn::TraitItemFn) -> syn::Result<Self> {
        let sig = &method.sig;
        if sig.asyncness.is_some() {
            return Err(syn::Error::new_spanned(
                sig.asyncness,
                "#[double] does not support async methods",
            ));
        }
        if !sig.generics.params.is_empty() {
            return Err(syn::Error::new_spanned(
                &sig.generics,
                "#[double] does not support generic methods",
            ));
        }

        let mutable_receiver = match sig.receiver() {
            Some(receiver) if receiver.reference.is_some() && receiver.colon_token.is_none() => {
                receiver.mutability.is_some()
            }
            Some(receiver) => {
                return Err(syn::Error::new_spanned(
                    receiver,
                    "#[double] methods must take `&self` or `&mut self`",
                ))
            }
            None => {
                return Err(syn::Error::new_spanned(
                    sig,
                    "#[double] methods must take `&self` or `&mut self`",
                ))
            }
        };

        let params = sig
            .inputs
            .iter()
            .filter_map(|input| match input {
                syn::FnArg::Typed(pat_type) => Some(pat_type),
                syn::FnArg::Receiver(_) => None,
            })
            .enumerate()
            .map(|(index, pat_type)| analyze_param(index, pat_type))
            .collect::<syn::Result<Vec<_>>>()?;

        let output_structure = OutputStructure::analyze(&sig.output)?;
        let attr = MethodAttr::collect(&method.attrs)?;

        let member = match &attr.access {
            Access::Get(name) => {
                if !params.is_empty() || output_structure.is_unit() {
                    return Err(syn::Error::new_spanned(
                        sig,
                        "a property getter takes no arguments and returns a value",
                    ));
                }
                name.clone()
            }
            Access::Set(name) => {
                if params.len() != 1 || !output_structure.is_unit() {
                    return Err(syn::Error::new_spanned(
                        sig,
                        "a property setter takes exactly one argument and returns nothing",
                    ));
                }
                name.clone()
            }
            Access::Method => attr.rename.unwrap_or_else(|| sig.ident.to_string()),
        };

        Ok(Self {
            method,
            member,
            access: attr.access,
            sealed: attr.sealed,
            mutable_receiver,
            params,
            output_structure,
        })
    }

    pub fn is_property(&self) -> bool {
        self.access != Access::Method
    }

    /// The method signature with every parameter bound to a plain identifier.
    pub fn signature(&self) -> syn::Signature {
        let mut sig = self.method.sig.clone();
        let mut params = self.params.iter();
        for input in sig.inputs.iter_mut() {
            if let (syn::FnArg::Typed(pat_type), Some(param)) = (input, params.next()) {
                *pat_type.pat = syn::Pat::Ident(syn::PatIdent {
                    attrs: Vec::new(),
                    by_ref: None,
                    mutability: None,
                    ident: param.ident.clone(),
                    subpat: None,
                });
            }
        }
        sig
    }

    /// Builds the call signature the double receives.
    pub fn call_signature(&self, prefix: &syn::Path) -> TokenStream {
        let member = &self.member;
        match &self.access {
            Access::Method => {
                let args = self.params.iter().map(|param| param.into_value(prefix));
                quote! { #prefix::CallSignature::method(#member, [#(#args),*]) }
            }
            Access::Get(_) => quote! { #prefix::CallSignature::get(#member) },
            Access::Set(_) => {
                let value = self.params.iter().map(|param| param.into_value(prefix));
                quote! { #prefix::CallSignature::set(#member, #(#value)*) }
            }
        }
    }

    /// Match arm forwarding a call to the real implementation held in
    /// `self.0`.
    pub fn base_arm(&self, prefix: &syn::Path, trait_ident: &syn::Ident) -> TokenStream {
        let member = &self.member;
        let method_ident = &self.method.sig.ident;
        let kind = match &self.access {
            Access::Method => quote! { #prefix::CallKind::Method },
            Access::Get(_) => quote! { #prefix::CallKind::Get },
            Access::Set(_) => quote! { #prefix::CallKind::Set },
        };
        let receiver = if self.mutable_receiver {
            quote! { &mut self.0 }
        } else {
            quote! { &self.0 }
        };
        let decode = self.params.iter().enumerate().map(|(index, param)| {
            let ident = &param.ident;
            let value_type = param.value_type();
            quote! {
                let #ident: #value_type = #prefix::macro_api::arg(call, #index)?;
            }
        });
        let pass = self.params.iter().map(|param| {
            let ident = &param.ident;
            if param.borrowed {
                quote! { ::std::borrow::Borrow::borrow(&#ident) }
            } else {
                quote! { #ident }
            }
        });
        let ret = self.output_structure.ret(
            prefix,
            quote! { #trait_ident::#method_ident(#receiver, #(#pass),*) },
        );
        quote! {
            (#kind, #member) => {
                #(#decode)*
                #ret
            }
        }
    }
}

fn analyze_param(index: usize, pat_type: &syn::PatType) -> syn::Result<Param> {
    let ident = match pat_type.pat.as_ref() {
        syn::Pat::Ident(pat_ident) if pat_ident.subpat.is_none() => pat_ident.ident.clone(),
        _ => format_ident!("arg{}", index),
    };
    match pat_type.ty.as_ref() {
        syn::Type::Reference(reference) if reference.mutability.is_some() => {
            Err(syn::Error::new_spanned(
                reference,
                "#[double] does not support `&mut` parameters",
            ))
        }
        syn::Type::Reference(reference) => Ok(Param {
            ident,
            ty: reference.elem.as_ref().clone(),
            borrowed: true,
        }),
        syn::Type::ImplTrait(impl_trait) => Err(syn::Error::new_spanned(
            impl_trait,
            "#[double] does not support generic methods",
        )),
        ty => Ok(Param {
            ident,
            ty: ty.clone(),
            borrowed: false,
        }),
    }
}
