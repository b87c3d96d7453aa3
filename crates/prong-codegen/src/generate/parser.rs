use std::collections::BTreeSet;

use prong_core::grammar::{CompiledGrammar, Label, MacroArg, MacroCall, MacroKind, Node, RuleTable};
use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote, ToTokens};
use syn::Ident;

/// Token class names that the scanner recognizes by kind rather than as keywords
const TOKEN_CLASSES: &[&str] = &["IDENTIFIER", "IDENT", "NUMBER", "STRING"];

/// Generates a direct-coded recursive descent parser: one `parse_<rule>` method per rule, each
/// choice dispatched on the first sets of its alternatives.
pub struct ParserGenerator<'g> {
    grammar: CompiledGrammar<'g>,
    parse_fns: Vec<ParseFn>,
}

struct ParseFn {
    rule: String,
    body: TokenStream,
}

impl ToTokens for ParseFn {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let fn_name = parse_fn_name(&self.rule);
        let rule = &self.rule;
        let body = &self.body;
        quote! {
            pub fn #fn_name(&mut self) -> Result<runtime::SyntaxNode, ParseError> {
                let mut node = runtime::SyntaxNode::new(#rule);
                #body
                Ok(node)
            }
        }
        .to_tokens(tokens)
    }
}

fn parse_fn_name(rule: &str) -> Ident {
    format_ident!("parse_{}", rule)
}

impl<'g> ToTokens for ParserGenerator<'g> {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        self.generate().to_tokens(tokens)
    }
}

impl<'g> ParserGenerator<'g> {
    /// Generates the body of every rule. `span` is where grammar errors are reported.
    pub fn new(grammar: CompiledGrammar<'g>, span: Span) -> syn::Result<Self> {
        let body = BodyGenerator { grammar, span };
        let parse_fns = grammar
            .rules()
            .iter()
            .map(|rule| {
                Ok(ParseFn {
                    rule: rule.target().to_owned(),
                    body: body.node(rule.body())?,
                })
            })
            .collect::<syn::Result<Vec<_>>>()?;

        Ok(Self { grammar, parse_fns })
    }

    fn generate(&self) -> impl ToTokens {
        let reserved = reserved_words(self.grammar.rules());
        let goal_fn = parse_fn_name(self.grammar.goal());
        let parse_fns = &self.parse_fns;

        quote! {
            /// Words the scanner reports as reserved tokens
            pub const RESERVED: &[&str] = &[#(#reserved),*];

            pub struct Parser<L> {
                lexer: L,
                operators: OperatorTable,
            }

            impl<L: Lexer> Parser<L> {
                pub fn new(lexer: L) -> Self {
                    Self::with_operators(lexer, OperatorTable::standard())
                }

                /// Uses `operators` for the expressions parsed by `precedence(n)`
                pub fn with_operators(lexer: L, operators: OperatorTable) -> Self {
                    Self { lexer, operators }
                }

                pub fn lexer(&self) -> &L {
                    &self.lexer
                }

                pub fn into_lexer(self) -> L {
                    self.lexer
                }

                /// Parses the goal rule, which must span the whole input
                pub fn parse(&mut self) -> Result<runtime::SyntaxNode, ParseError> {
                    let node = self.#goal_fn()?;
                    runtime::expect_end(&self.lexer)?;
                    Ok(node)
                }

                #(#parse_fns)*
            }

            pub fn parse(input: &str) -> Result<runtime::SyntaxNode, Error> {
                let scanner = Scanner::with_reserved(input, RESERVED.iter().copied())?;
                Ok(Parser::new(scanner).parse()?)
            }
        }
    }
}

struct BodyGenerator<'g> {
    grammar: CompiledGrammar<'g>,
    span: Span,
}

impl BodyGenerator<'_> {
    fn node(&self, node: &Node) -> syn::Result<TokenStream> {
        let tokens = match node {
            Node::Sequence { .. } => {
                let parts = node
                    .to_seq_array()
                    .into_iter()
                    .map(|n| self.node(n))
                    .collect::<syn::Result<Vec<_>>>()?;
                quote! { #(#parts)* }
            }
            Node::Alternative { .. } => self.choice(node)?,
            Node::Literal(s) => quote! {
                node.children.push(runtime::SyntaxElement::Token(
                    runtime::expect_literal(&mut self.lexer, #s)?
                ));
            },
            Node::Reserved(name) => quote! {
                node.children.push(runtime::SyntaxElement::Token(
                    runtime::expect_reserved(&mut self.lexer, #name)?
                ));
            },
            Node::NonTerminal(name) => {
                let f = parse_fn_name(name);
                quote! {
                    node.children.push(runtime::SyntaxElement::Node(self.#f()?));
                }
            }
            Node::MacroCall(call) => self.macro_call(call)?,
            Node::Action(expr) => {
                let rendered = expr.to_string();
                quote! {
                    node.children.push(runtime::SyntaxElement::Action(#rendered));
                }
            }
            Node::Empty => quote! {},
        };

        Ok(tokens)
    }

    /// `if first(a) { a } else if first(b) { b } else { nullable branch or error }`
    fn choice(&self, node: &Node) -> syn::Result<TokenStream> {
        let mut guarded = Vec::new();
        let mut fallback = None;
        let mut expected = BTreeSet::new();

        for branch in node.to_alt_array() {
            let first = self
                .grammar
                .first_of(branch)
                .map_err(|e| syn::Error::new(self.span, e))?;
            let body = self.node(branch)?;

            // the resolver guarantees at most one nullable branch per choice
            if first.contains_empty() {
                fallback = Some(body);
                continue;
            }

            expected.extend(first.iter().map(Label::describe));
            let guards = first.iter().map(guard);
            guarded.push(quote! {
                if #(#guards)||* {
                    #body
                }
            });
        }

        let fallback = fallback.unwrap_or_else(|| {
            let expected = expected.iter();
            quote! {
                return Err(runtime::expected(&self.lexer, &[#(#expected),*]));
            }
        });

        Ok(quote! {
            #(#guarded else)* {
                #fallback
            }
        })
    }

    fn macro_call(&self, call: &MacroCall) -> syn::Result<TokenStream> {
        let tokens = match call.kind {
            MacroKind::Lookahead => {
                let expects = expectations(&call.args);
                let signature = call.signature();
                quote! {
                    if !runtime::at_lookahead(&self.lexer, &[#(#expects),*]) {
                        return Err(runtime::expected(&self.lexer, &[#signature]));
                    }
                }
            }
            MacroKind::Precedence => {
                let min_bp = match call.args.as_slice() {
                    [MacroArg::Number(n)] => n.parse::<u32>().ok(),
                    _ => None,
                };
                let Some(min_bp) = min_bp else {
                    return Err(syn::Error::new(
                        self.span,
                        format_args!("invalid binding power in `{call}`"),
                    ));
                };
                quote! {
                    node.children.push(runtime::SyntaxElement::Expr(
                        runtime::expression(&mut self.lexer, &self.operators, #min_bp)?
                    ));
                }
            }
            MacroKind::Error => {
                let message = call
                    .args
                    .iter()
                    .find_map(|arg| match arg {
                        MacroArg::Str(s) => Some(s.clone()),
                        _ => None,
                    })
                    .unwrap_or_else(|| call.signature());
                quote! {
                    return Err(runtime::fail(&self.lexer, #message));
                }
            }
            MacroKind::Recover => {
                let anchors = expectations(&call.args);
                quote! {
                    node.children.extend(
                        runtime::recover(&mut self.lexer, &[#(#anchors),*])
                            .into_iter()
                            .map(runtime::SyntaxElement::Token),
                    );
                }
            }
        };

        Ok(tokens)
    }
}

fn guard(label: &Label) -> TokenStream {
    match label {
        Label::Literal(s) => quote! { runtime::at_literal(&self.lexer, #s) },
        Label::Reserved(name) => quote! { runtime::at_reserved(&self.lexer, #name) },
        Label::Guard(call) => match call.kind {
            MacroKind::Lookahead => {
                let expects = expectations(&call.args);
                quote! { runtime::at_lookahead(&self.lexer, &[#(#expects),*]) }
            }
            MacroKind::Precedence => {
                quote! { runtime::at_expression(&self.lexer, &self.operators) }
            }
            // nullable, never a label
            MacroKind::Error | MacroKind::Recover => quote! { false },
        },
    }
}

fn expectations(args: &[MacroArg]) -> Vec<TokenStream> {
    args.iter()
        .map(|arg| match arg {
            MacroArg::Name(name) => quote! { runtime::Expect::Reserved(#name) },
            MacroArg::Str(s) | MacroArg::Number(s) => quote! { runtime::Expect::Literal(#s) },
        })
        .collect()
}

/// Keywords named by the grammar, lowercased: reserved names other than the token classes,
/// including those passed to `lookahead` and `recover`.
fn reserved_words(rules: &RuleTable) -> Vec<String> {
    fn walk(node: &Node, out: &mut BTreeSet<String>) {
        match node {
            Node::Sequence { head, tail } => {
                walk(head, out);
                if let Some(tail) = tail {
                    walk(tail, out);
                }
            }
            Node::Alternative { left, right } => {
                walk(left, out);
                walk(right, out);
            }
            Node::Reserved(name) => add(name, out),
            Node::MacroCall(call) => {
                for arg in &call.args {
                    if let MacroArg::Name(name) = arg {
                        add(name, out);
                    }
                }
            }
            _ => (),
        }
    }

    fn add(name: &str, out: &mut BTreeSet<String>) {
        if !TOKEN_CLASSES.contains(&name) {
            out.insert(name.to_ascii_lowercase());
        }
    }

    let mut words = BTreeSet::new();
    for rule in rules.iter() {
        walk(rule.body(), &mut words);
    }

    words.into_iter().collect()
}

#[cfg(test)]
mod test {
    use prong_core::grammar::Grammar;

    use super::*;

    #[test]
    fn keywords() {
        let grammar = Grammar::parse(
            r#"
            stmt ::= RETURN precedence(0) ";" | IF IDENT stmt | recover(SEMI, ";") ;
            "#,
        )
        .unwrap();
        assert_eq!(reserved_words(grammar.rules()), ["if", "return", "semi"]);
    }

    #[test]
    fn generates_one_method_per_rule() {
        let grammar = Grammar::parse(
            r#"
            list ::= "[" [items] "]" ;
            items ::= NUMBER ("," items | <empty>) ;
            "#,
        )
        .unwrap();
        let compiled = grammar.compile().unwrap();
        let generator = ParserGenerator::new(compiled, Span::call_site()).unwrap();
        let code = generator.to_token_stream().to_string();
        assert!(code.contains("fn parse_list"));
        assert!(code.contains("fn parse_items"));
        assert!(code.contains("self . parse_list ()"));
    }

    #[test]
    fn reports_grammar_errors() {
        let grammar = Grammar::parse(r#"a ::= "x" | "x" ;"#).unwrap();
        assert!(grammar.compile().is_err());
    }
}
