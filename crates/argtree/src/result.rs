//! Parse results: the per-parse result arena, resolved argument outcomes and
//! accumulated errors.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;

use crate::argument::Value;
use crate::symbol::{Symbol, SymbolId, SymbolTree};
use crate::token::{Token, render_command_line};

/// Index of a result inside its [`ParseResult`]. The root command is `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResultId(pub(crate) usize);

impl ResultId {
    pub const ROOT: ResultId = ResultId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Command,
    Option,
}

/// Outcome of resolving one result's tokens against its argument spec.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentResult {
    Success(Value),
    MissingRequiredValue,
    TooManyValues,
    TypeConversionFailed(String),
    /// Tokens were rejected by an allowed-value set or a custom validator.
    Unparsed,
}

impl ArgumentResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    TokenizeError,
    UnrecognizedToken,
    MissingRequiredValue,
    TooManyValues,
    TypeConversionFailed,
    DisallowedValue { value: String, allowed: Vec<String> },
    CustomValidationFailed,
    RequiredSubcommandMissing,
}

/// A user-input problem. Parse errors are collected, never returned as `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    kind: ParseErrorKind,
    message: String,
    result: Option<ResultId>,
    token: Option<Token>,
    can_retry_token: bool,
}

impl ParseError {
    pub(crate) fn new(
        kind: ParseErrorKind,
        message: impl Into<String>,
        result: Option<ResultId>,
        token: Option<Token>,
        can_retry_token: bool,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            result,
            token,
            can_retry_token,
        }
    }

    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The result the error is about, if any.
    pub fn result(&self) -> Option<ResultId> {
        self.result
    }

    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// Whether the matcher was allowed to offer the last token elsewhere.
    pub fn can_retry_token(&self) -> bool {
        self.can_retry_token
    }
}

/// Matched command or option. Built by the matcher, completed by resolution.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SymbolResult {
    pub(crate) kind: ResultKind,
    pub(crate) symbol: SymbolId,
    pub(crate) token: Token,
    pub(crate) parent: Option<ResultId>,
    pub(crate) tokens: Vec<Token>,
    pub(crate) children: Vec<ResultId>,
    pub(crate) implicit: bool,
    pub(crate) uses_default: bool,
    pub(crate) outcome: Option<ArgumentResult>,
}

impl SymbolResult {
    pub(crate) fn new(
        kind: ResultKind,
        symbol: SymbolId,
        token: Token,
        parent: Option<ResultId>,
    ) -> Self {
        Self {
            kind,
            symbol,
            token,
            parent,
            tokens: Vec::new(),
            children: Vec::new(),
            implicit: false,
            uses_default: false,
            outcome: None,
        }
    }
}

/// The terminal artifact of a parse.
///
/// Owns everything produced by the parse; shares the symbol tree read-only.
/// Two results compare equal when they were produced from the same tree and
/// are structurally identical.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub(crate) tree: Arc<SymbolTree>,
    pub(crate) raw: Vec<String>,
    pub(crate) tokens: Vec<Token>,
    pub(crate) directives: IndexMap<String, Vec<String>>,
    pub(crate) results: Vec<SymbolResult>,
    pub(crate) command: ResultId,
    pub(crate) unmatched: Vec<Token>,
    pub(crate) unparsed: Vec<Token>,
    pub(crate) errors: Vec<ParseError>,
}

impl PartialEq for ParseResult {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.tree, &other.tree)
            && self.raw == other.raw
            && self.tokens == other.tokens
            && self.directives == other.directives
            && self.results == other.results
            && self.command == other.command
            && self.unmatched == other.unmatched
            && self.unparsed == other.unparsed
            && self.errors == other.errors
    }
}

impl ParseResult {
    pub fn tree(&self) -> &SymbolTree {
        &self.tree
    }

    pub fn raw_args(&self) -> &[String] {
        &self.raw
    }

    /// The original input rendered back into a single command line.
    pub fn raw_input(&self) -> String {
        render_command_line(&self.raw)
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn root(&self) -> ResultRef<'_> {
        self.get(ResultId::ROOT)
    }

    /// Innermost matched command.
    pub fn command(&self) -> ResultRef<'_> {
        self.get(self.command)
    }

    pub fn get(&self, id: ResultId) -> ResultRef<'_> {
        ResultRef {
            parse: self,
            id,
            pending: None,
        }
    }

    pub fn results(&self) -> impl Iterator<Item = ResultRef<'_>> {
        (0..self.results.len()).map(|i| self.get(ResultId(i)))
    }

    pub fn directives(&self) -> &IndexMap<String, Vec<String>> {
        &self.directives
    }

    /// Values of a directive, `None` if it was not given.
    pub fn directive(&self, name: &str) -> Option<&[String]> {
        self.directives.get(name).map(Vec::as_slice)
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn unmatched_tokens(&self) -> &[Token] {
        &self.unmatched
    }

    pub fn unparsed_tokens(&self) -> &[Token] {
        &self.unparsed
    }

    /// Result for a symbol matched by alias, searching the matched command
    /// path from the innermost command outwards.
    pub fn find_result_for(&self, alias: &str) -> Option<ResultRef<'_>> {
        let mut current = Some(self.command());
        while let Some(command) = current {
            if command.symbol().has_alias(alias) {
                return Some(command);
            }
            if let Some(child) = command.child(alias) {
                return Some(child);
            }
            current = command.parent();
        }
        None
    }

    /// Successfully resolved value of the symbol matched by `alias`.
    pub fn value_for(&self, alias: &str) -> Option<&Value> {
        self.find_result_for(alias).and_then(|r| r.value())
    }

    pub(crate) fn data(&self, id: ResultId) -> &SymbolResult {
        &self.results[id.0]
    }
}

/// Borrowed view of one command or option result.
#[derive(Clone, Copy)]
pub struct ResultRef<'a> {
    parse: &'a ParseResult,
    id: ResultId,
    pending: Option<&'a Value>,
}

impl<'a> ResultRef<'a> {
    /// View handed to validators: the converted value is visible through
    /// [`ResultRef::value`] before the outcome is recorded.
    pub(crate) fn with_pending(self, value: &'a Value) -> Self {
        Self {
            pending: Some(value),
            ..self
        }
    }

    fn data(&self) -> &'a SymbolResult {
        self.parse.data(self.id)
    }

    pub fn id(&self) -> ResultId {
        self.id
    }

    pub fn kind(&self) -> ResultKind {
        self.data().kind
    }

    pub fn symbol(&self) -> &'a Symbol {
        self.parse.tree.get(self.data().symbol)
    }

    pub fn name(&self) -> &'a str {
        self.symbol().name()
    }

    /// The token that introduced this result.
    pub fn token(&self) -> &'a Token {
        &self.data().token
    }

    /// Value tokens consumed by this result.
    pub fn tokens(&self) -> &'a [Token] {
        &self.data().tokens
    }

    pub fn values(&self) -> Vec<&'a str> {
        self.tokens().iter().map(Token::value).collect()
    }

    pub fn parent(&self) -> Option<ResultRef<'a>> {
        self.data().parent.map(|id| self.parse.get(id))
    }

    pub fn children(&self) -> impl Iterator<Item = ResultRef<'a>> + 'a {
        let parse = self.parse;
        self.data().children.iter().map(move |id| parse.get(*id))
    }

    pub fn child(&self, alias: &str) -> Option<ResultRef<'a>> {
        self.children().find(|c| c.symbol().has_alias(alias))
    }

    pub fn has_child(&self, alias: &str) -> bool {
        self.child(alias).is_some()
    }

    /// Injected for a default value rather than matched from input.
    pub fn is_implicit(&self) -> bool {
        self.data().implicit
    }

    pub fn uses_default_value(&self) -> bool {
        self.data().uses_default
    }

    pub fn outcome(&self) -> Option<&'a ArgumentResult> {
        self.data().outcome.as_ref()
    }

    pub fn value(&self) -> Option<&'a Value> {
        self.pending
            .or_else(|| self.outcome().and_then(ArgumentResult::value))
    }

    pub fn errors(&self) -> impl Iterator<Item = &'a ParseError> + 'a {
        let id = self.id;
        self.parse
            .errors
            .iter()
            .filter(move |e| e.result == Some(id))
    }

    pub fn has_error(&self) -> bool {
        self.errors().next().is_some()
    }
}

impl fmt::Debug for ResultRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultRef")
            .field("id", &self.id)
            .field("symbol", &self.name())
            .field("tokens", &self.values())
            .field("outcome", &self.outcome())
            .finish()
    }
}
