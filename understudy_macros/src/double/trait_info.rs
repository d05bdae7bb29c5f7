use super::attr::Attr;
use super::method;

pub struct TraitInfo<'t> {
    pub input_trait: &'t syn::ItemTrait,
    pub double_ident: syn::Ident,
    pub methods: Vec<method::MockMethod<'t>>,
    pub accessible: bool,
    pub partial: bool,
}

impl<'t> TraitInfo<'t> {
    pub fn analyze(input_trait: &'t syn::ItemTrait, attr: &Attr) -> syn::Result<Self> {
        if let Some(param) = input_trait.generics.params.first() {
            return Err(syn::Error::new_spanned(
                param,
                "#[double] does not support generic traits",
            ));
        }
        if let Some(where_clause) = &input_trait.generics.where_clause {
            return Err(syn::Error::new_spanned(
                where_clause,
                "#[double] does not support where clauses on traits",
            ));
        }
        for bound in &input_trait.supertraits {
            if !is_auto_bound(bound) {
                return Err(syn::Error::new_spanned(
                    bound,
                    "#[double] only supports `Send` and `Sync` as supertraits",
                ));
            }
        }

        let methods = method::extract_methods(input_trait)?;

        let double_ident = match &attr.name {
            Some(name) => name.clone(),
            None => quote::format_ident!("{}Double", input_trait.ident),
        };
        let accessible =
            attr.expose || matches!(input_trait.vis, syn::Visibility::Public(_));

        Ok(Self {
            input_trait,
            double_ident,
            methods,
            accessible,
            partial: attr.partial,
        })
    }

    pub fn trait_ident(&self) -> &syn::Ident {
        &self.input_trait.ident
    }

    /// Names of every property, in order of first appearance.
    pub fn property_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for method in self.methods.iter().filter(|method| method.is_property()) {
            if !names.contains(&method.member.as_str()) {
                names.push(&method.member);
            }
        }
        names
    }

    pub fn accessors(&self, property: &str) -> impl Iterator<Item = &method::MockMethod<'t>> {
        let property = property.to_owned();
        self.methods
            .iter()
            .filter(move |method| method.is_property() && method.member == property)
    }
}

fn is_auto_bound(bound: &syn::TypeParamBound) -> bool {
    match bound {
        syn::TypeParamBound::Trait(trait_bound) => trait_bound
            .path
            .segments
            .last()
            .map(|segment| segment.ident == "Send" || segment.ident == "Sync")
            .unwrap_or(false),
        _ => false,
    }
}
