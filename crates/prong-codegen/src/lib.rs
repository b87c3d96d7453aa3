use parse::GrammarInput;
use proc_macro::TokenStream;
use prong_core::grammar::Grammar;
use syn::parse_macro_input;

mod config;
mod generate;
mod parse;

/// Compiles a grammar into a `parser` module holding a recursive descent `Parser`.
///
/// ```ignore
/// prong::grammar! {
///     #![config(goal = stmt)]
///     r#"
///     stmt ::= "let" IDENT "=" precedence(0) ";" | IDENT "=" precedence(0) ";" ;
///     "#
/// }
/// ```
#[proc_macro]
pub fn grammar(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as GrammarInput);
    match grammar_inner(input) {
        Ok(out) => out,
        Err(e) => e.to_compile_error().into(),
    }
}

fn grammar_inner(input: GrammarInput) -> syn::Result<TokenStream> {
    let source = input.source();
    let mut grammar =
        Grammar::parse(&source.value()).map_err(|e| syn::Error::new(source.span(), e))?;

    if let Some(ref goal) = input.config().goal {
        if grammar.rules().get(&goal.to_string()).is_none() {
            return Err(syn::Error::new_spanned(
                goal,
                format_args!("`{goal}` is not a grammar rule"),
            ));
        }
        grammar = grammar.with_goal(goal.to_string());
    }

    let compiled = grammar
        .compile()
        .map_err(|e| syn::Error::new(source.span(), e))?;
    let parser = generate::ParserGenerator::new(compiled, source.span())?;

    Ok(quote::quote! {
        pub mod parser {
            #![allow(non_snake_case, unused_mut, unreachable_code, dead_code)]
            use prong::runtime;
            use prong::{Error, Lexer, OperatorTable, ParseError, Scanner};

            #parser
        }
    }
    .into())
}
