//! Parses the content of the grammar macro: optional inner attributes followed by the grammar
//! source as a string literal.
use syn::parse::{Parse, ParseStream};
use syn::{Attribute, LitStr};

use crate::config::Config;

pub struct GrammarInput {
    config: Config,
    source: LitStr,
}

impl GrammarInput {
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn source(&self) -> &LitStr {
        &self.source
    }
}

impl Parse for GrammarInput {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_inner)?;
        let config = Config::from_attributes(&attrs)?;
        let source = input.parse::<LitStr>()?;
        if !input.is_empty() {
            return Err(input.error("unexpected tokens after the grammar source"));
        }

        Ok(Self { config, source })
    }
}
