use syn::meta::ParseNestedMeta;

/// Arguments of the `#[double(..)]` attribute on a trait.
#[derive(Default)]
pub struct Attr {
    pub prefix: Option<syn::Path>,
    pub name: Option<syn::Ident>,
    pub partial: bool,
    pub expose: bool,
}

impl Attr {
    pub fn parse(&mut self, meta: ParseNestedMeta) -> syn::Result<()> {
        if meta.path.is_ident("prefix") {
            self.prefix = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("name") {
            self.name = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("partial") {
            self.partial = true;
        } else if meta.path.is_ident("expose") {
            self.expose = true;
        } else {
            return Err(meta.error("unrecognized double attribute"));
        }
        Ok(())
    }

    pub fn prefix(&self) -> syn::Path {
        match &self.prefix {
            Some(prefix) => prefix.clone(),
            None => syn::parse_quote! { ::understudy },
        }
    }
}

/// How a trait method is exposed as a capability member.
#[derive(Clone, PartialEq, Eq)]
pub enum Access {
    Method,
    Get(String),
    Set(String),
}

/// Arguments of `#[double(..)]` attributes on a trait method.
pub struct MethodAttr {
    pub access: Access,
    pub rename: Option<String>,
    pub sealed: bool,
}

impl MethodAttr {
    /// Collects every `#[double(..)]` attribute among `attrs`.
    pub fn collect(attrs: &[syn::Attribute]) -> syn::Result<Self> {
        let mut out = Self {
            access: Access::Method,
            rename: None,
            sealed: false,
        };
        for attr in attrs.iter().filter(|attr| is_double_attr(attr)) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("get") {
                    let name: syn::LitStr = meta.value()?.parse()?;
                    out.set_access(Access::Get(name.value()), &meta)
                } else if meta.path.is_ident("set") {
                    let name: syn::LitStr = meta.value()?.parse()?;
                    out.set_access(Access::Set(name.value()), &meta)
                } else if meta.path.is_ident("rename") {
                    let name: syn::LitStr = meta.value()?.parse()?;
                    out.rename = Some(name.value());
                    Ok(())
                } else if meta.path.is_ident("sealed") {
                    out.sealed = true;
                    Ok(())
                } else {
                    Err(meta.error("unrecognized double member attribute"))
                }
            })?;
        }
        if out.rename.is_some() && out.access != Access::Method {
            return Err(syn::Error::new_spanned(
                &attrs[0],
                "`rename` cannot be combined with `get` or `set`, which already name the property",
            ));
        }
        Ok(out)
    }

    fn set_access(&mut self, access: Access, meta: &ParseNestedMeta) -> syn::Result<()> {
        if self.access != Access::Method {
            return Err(meta.error("a method can only access one property"));
        }
        self.access = access;
        Ok(())
    }
}

pub fn is_double_attr(attr: &syn::Attribute) -> bool {
    attr.path().is_ident("double")
}
