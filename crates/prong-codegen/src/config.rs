use syn::{Attribute, Ident};

/// Settings passed to `grammar!` through an inner `#![config(...)]` attribute.
#[derive(Debug, Default)]
pub struct Config {
    /// Rule the generated `parse` entry points start from. Inferred from the grammar when absent.
    pub goal: Option<Ident>,
}

impl Config {
    pub fn from_attributes(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut config = Config::default();
        for attr in attrs {
            if !attr.path().is_ident("config") {
                return Err(syn::Error::new_spanned(
                    attr,
                    "unsupported attribute, expected `#![config(...)]`",
                ));
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("goal") {
                    config.goal = Some(meta.value()?.parse()?);
                    Ok(())
                } else {
                    Err(meta.error("unknown config key"))
                }
            })?;
        }

        Ok(config)
    }
}
