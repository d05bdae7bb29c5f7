use proc_macro2::TokenStream;
use quote::quote;

pub enum OutputWrapping {
    /// `()` or no return type at all.
    Unit,
    Plain(syn::Type),
    /// `Result<T, E>`. A configured error that is an `E` comes back as `Err`.
    Fallible { ok: syn::Type, err: syn::Type },
}

pub struct OutputStructure {
    pub wrapping: OutputWrapping,
}

impl OutputStructure {
    pub fn analyze(output: &syn::ReturnType) -> syn::Result<Self> {
        let ty = match output {
            syn::ReturnType::Default => {
                return Ok(Self {
                    wrapping: OutputWrapping::Unit,
                })
            }
            syn::ReturnType::Type(_, ty) => ty.as_ref(),
        };

        let wrapping = match ty {
            syn::Type::Tuple(tuple) if tuple.elems.is_empty() => OutputWrapping::Unit,
            syn::Type::Reference(_) => {
                return Err(syn::Error::new_spanned(
                    ty,
                    "#[double] methods must return owned values",
                ))
            }
            syn::Type::ImplTrait(_) => {
                return Err(syn::Error::new_spanned(
                    ty,
                    "#[double] does not support `impl Trait` return types",
                ))
            }
            syn::Type::Path(path) => match result_parts(path) {
                Some((ok, err)) => OutputWrapping::Fallible { ok, err },
                None => OutputWrapping::Plain(ty.clone()),
            },
            _ => OutputWrapping::Plain(ty.clone()),
        };
        Ok(Self { wrapping })
    }

    pub fn is_unit(&self) -> bool {
        matches!(self.wrapping, OutputWrapping::Unit)
    }

    /// The type the double decodes a call's result into.
    pub fn value_type(&self) -> TokenStream {
        match &self.wrapping {
            OutputWrapping::Unit => quote! { () },
            OutputWrapping::Plain(ty) => quote! { #ty },
            OutputWrapping::Fallible { ok, .. } => quote! { #ok },
        }
    }

    /// Dispatches `call` on `double` and converts the outcome into the
    /// method's return type.
    pub fn eval(&self, prefix: &syn::Path, double: TokenStream, call: TokenStream) -> TokenStream {
        match &self.wrapping {
            OutputWrapping::Unit => quote! {
                #prefix::macro_api::eval::<()>(#double, #call)
            },
            OutputWrapping::Plain(ty) => quote! {
                #prefix::macro_api::eval::<#ty>(#double, #call)
            },
            OutputWrapping::Fallible { ok, err } => quote! {
                #prefix::macro_api::eval_fallible::<#ok, #err>(#double, #call)
            },
        }
    }

    /// Encodes what a real implementation returned.
    pub fn ret(&self, prefix: &syn::Path, result: TokenStream) -> TokenStream {
        match &self.wrapping {
            OutputWrapping::Fallible { .. } => quote! {
                #prefix::macro_api::ret_fallible(#result)
            },
            _ => quote! {
                #prefix::macro_api::ret(#result)
            },
        }
    }
}

/// `Result<T, E>`, or `some::Result<T>` with `some::Error` as the error type.
fn result_parts(path: &syn::TypePath) -> Option<(syn::Type, syn::Type)> {
    if path.qself.is_some() {
        return None;
    }
    let last = path.path.segments.last()?;
    if last.ident != "Result" {
        return None;
    }
    let syn::PathArguments::AngleBracketed(generics) = &last.arguments else {
        return None;
    };
    let mut types = generics.args.iter().filter_map(|arg| match arg {
        syn::GenericArgument::Type(ty) => Some(ty.clone()),
        _ => None,
    });

    match (types.next(), types.next(), types.next()) {
        (Some(ok), Some(err), None) => Some((ok, err)),
        (Some(ok), None, None) if path.path.segments.len() > 1 => {
            let mut error_path = path.path.clone();
            if let Some(segment) = error_path.segments.last_mut() {
                *segment = syn::PathSegment::from(syn::Ident::new("Error", last.ident.span()));
            }
            Some((ok, syn::Type::Path(syn::TypePath {
                qself: None,
                path: error_path,
            })))
        }
        _ => None,
    }
}
