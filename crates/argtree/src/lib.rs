//! Command-line grammar engine.
//!
//! A grammar is declared once as an immutable [`SymbolTree`] of commands and
//! options, each owning an [`ArgumentSpec`]. A [`Parser`] turns raw argument
//! lists into a [`ParseResult`]: a result tree, the unmatched and unparsed
//! tokens, and every error found along the way. Parsing never fails outright;
//! invalid input still yields a best-effort result for diagnostics and
//! completion.
//!
//! ```
//! use argtree::{ArgumentBuilder, CommandBuilder, OptionBuilder, Parser, Value, ValueType};
//!
//! let tree = CommandBuilder::new("tool")
//!     .option(OptionBuilder::new("-n").alias("--count").argument(ArgumentBuilder::of(ValueType::Int)))
//!     .build()
//!     .unwrap();
//! let result = Parser::new(tree).parse(["--count", "3"]);
//! assert!(result.errors().is_empty());
//! assert_eq!(result.get_value("count"), Some(Value::Int(3)));
//! ```

pub mod argument;
pub mod binding;
mod diagram;
mod matcher;
pub mod messages;
mod resolve;
pub mod result;
pub mod suggest;
pub mod symbol;
pub mod token;
pub mod tokenizer;

use std::sync::Arc;

use indexmap::IndexMap;

pub use argument::{
    Arity, ArgumentBuilder, ArgumentSpec, SuggestionSource, UNBOUNDED, Validator, Value, ValueType,
};
pub use binding::{ValueDescriptor, ValueSource};
pub use result::{
    ArgumentResult, ParseError, ParseErrorKind, ParseResult, ResultId, ResultKind, ResultRef,
};
pub use suggest::Suggestions;
pub use symbol::{
    BuildError, CommandBuilder, HelpDetail, OptionBuilder, Symbol, SymbolId, SymbolKind,
    SymbolTree,
};
pub use token::{Token, TokenType, render_command_line, split_command_line};
pub use tokenizer::{Tokenization, TokenizeError, tokenize};

use resolve::Resolution;
use result::SymbolResult;

/// Parse entry point. Cheap to clone; the tree is shared.
#[derive(Debug, Clone)]
pub struct Parser {
    tree: Arc<SymbolTree>,
}

impl Parser {
    pub fn new(tree: SymbolTree) -> Self {
        Self::from_shared(Arc::new(tree))
    }

    pub fn from_shared(tree: Arc<SymbolTree>) -> Self {
        Self { tree }
    }

    pub fn tree(&self) -> &Arc<SymbolTree> {
        &self.tree
    }

    /// Parse a raw argument list. Deterministic: equal input yields an equal
    /// result.
    pub fn parse<I, S>(&self, args: I) -> ParseResult
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let raw: Vec<String> = args.into_iter().map(Into::into).collect();
        let tokenization = tokenize(&raw, &self.tree);
        let matched = matcher::match_tokens(&self.tree, &tokenization.tokens);

        let mut errors: Vec<ParseError> = tokenization
            .errors
            .into_iter()
            .map(|e| {
                ParseError::new(
                    ParseErrorKind::TokenizeError,
                    e.message,
                    None,
                    Some(e.token),
                    false,
                )
            })
            .collect();

        let mut result = ParseResult {
            tree: Arc::clone(&self.tree),
            directives: collect_directives(&tokenization.tokens),
            unparsed: tokenization
                .tokens
                .iter()
                .filter(|t| t.token_type() == TokenType::Unparsed)
                .cloned()
                .collect(),
            raw,
            tokens: tokenization.tokens,
            results: matched.results,
            command: matched.command,
            unmatched: matched.unmatched,
            errors: Vec::new(),
        };

        let resolutions: Vec<Resolution> = result.results().map(resolve::resolve).collect();
        for (index, resolution) in resolutions.into_iter().enumerate() {
            let id = ResultId(index);
            let entry: &mut SymbolResult = &mut result.results[index];
            match resolution {
                Resolution::Resolved {
                    value,
                    from_default,
                } => {
                    entry.outcome = Some(ArgumentResult::Success(value));
                    entry.uses_default = from_default;
                }
                Resolution::Failed(failure) => {
                    tracing::debug!(
                        result = index,
                        error = %failure.message,
                        "argument resolution failed"
                    );
                    entry.outcome = Some(failure.outcome);
                    errors.push(ParseError::new(
                        failure.kind,
                        failure.message,
                        Some(id),
                        Some(entry.token.clone()),
                        failure.can_retry_token,
                    ));
                }
            }
        }
        errors.extend(matched.errors);
        result.errors = errors;

        tracing::debug!(
            tokens = result.tokens.len(),
            results = result.results.len(),
            errors = result.errors.len(),
            "parsed command line"
        );
        result
    }

    /// Split a single command-line string and parse it.
    pub fn parse_str(&self, line: &str) -> ParseResult {
        self.parse(split_command_line(line))
    }

    /// Completion candidates for `input` with the cursor at `position`.
    pub fn suggest<'a>(&'a self, input: &str, position: usize) -> Suggestions<'a> {
        Suggestions::new(&self.tree, input, position)
    }
}

fn collect_directives(tokens: &[Token]) -> IndexMap<String, Vec<String>> {
    let mut directives: IndexMap<String, Vec<String>> = IndexMap::new();
    for token in tokens
        .iter()
        .filter(|t| t.token_type() == TokenType::Directive)
    {
        if let Some((name, value)) = tokenizer::parse_directive(token.value()) {
            let values = directives.entry(name.to_string()).or_default();
            if let Some(value) = value {
                values.push(value.to_string());
            }
        }
    }
    directives
}
