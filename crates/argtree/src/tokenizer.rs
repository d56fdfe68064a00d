//! Raw arguments to classified tokens.
//!
//! Classification is scope-aware: a token is an Option only if some command on
//! the current path declares that alias, and a Command only if it names a
//! child of the innermost command seen so far.

use thiserror::Error;

use crate::messages;
use crate::symbol::{SymbolId, SymbolTree};
use crate::token::{Token, TokenType};

/// A token whose shape could not be classified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TokenizeError {
    pub token: Token,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokenization {
    pub tokens: Vec<Token>,
    pub errors: Vec<TokenizeError>,
}

/// Classify `args` against `tree`. Never fails: malformed shapes become
/// [`TokenType::Unparsed`] tokens with a matching [`TokenizeError`].
pub fn tokenize<S: AsRef<str>>(args: &[S], tree: &SymbolTree) -> Tokenization {
    let mut out = Tokenization::default();
    let mut scope: Vec<SymbolId> = vec![tree.root().id()];
    let mut in_directives = true;
    let mut seen_first = false;
    let mut end_of_options = false;

    for (position, arg) in args.iter().enumerate() {
        let arg = arg.as_ref();

        if end_of_options {
            out.tokens
                .push(Token::new(arg, TokenType::Argument, position));
            continue;
        }

        if in_directives && arg.starts_with('[') {
            if parse_directive(arg).is_some() {
                out.tokens
                    .push(Token::new(arg, TokenType::Directive, position));
            } else {
                let token = Token::new(arg, TokenType::Unparsed, position);
                out.errors.push(TokenizeError {
                    message: messages::invalid_directive(arg),
                    token: token.clone(),
                });
                out.tokens.push(token);
            }
            continue;
        }
        in_directives = false;

        let first = !seen_first;
        seen_first = true;

        if arg == "--" {
            out.tokens
                .push(Token::new(arg, TokenType::EndOfOptions, position));
            end_of_options = true;
            continue;
        }

        let current = scope[scope.len() - 1];
        if let Some(command) = tree.child_command(current, arg) {
            out.tokens
                .push(Token::new(arg, TokenType::Command, position));
            scope.push(command.id());
            continue;
        }

        if first && tree.root().has_raw_alias(arg) {
            out.tokens
                .push(Token::new(arg, TokenType::Command, position));
            continue;
        }

        if tree.option_in_scope(&scope, arg).is_some() {
            out.tokens
                .push(Token::new(arg, TokenType::Option, position));
            continue;
        }

        if let Some((name, value)) = split_assignment(arg, tree, &scope) {
            out.tokens
                .push(Token::new(name, TokenType::Option, position));
            out.tokens
                .push(Token::new(value, TokenType::Argument, position));
            continue;
        }

        if let Some(parts) = unbundle(arg, tree, &scope) {
            out.tokens.extend(
                parts
                    .into_iter()
                    .map(|(value, token_type)| Token::new(value, token_type, position)),
            );
            continue;
        }

        out.tokens
            .push(Token::new(arg, TokenType::Argument, position));
    }

    tracing::trace!(
        tokens = out.tokens.len(),
        errors = out.errors.len(),
        "tokenized input"
    );
    out
}

/// Parse `[name]` / `[name:value]`. Returns `None` for malformed shapes.
pub fn parse_directive(raw: &str) -> Option<(&str, Option<&str>)> {
    let inner = raw.strip_prefix('[')?.strip_suffix(']')?;
    let (name, value) = match inner.split_once(':') {
        Some((name, value)) => (name, Some(value)),
        None => (inner, None),
    };
    if name.is_empty() || name.chars().any(|c| c.is_whitespace() || c == '[' || c == ']') {
        return None;
    }
    Some((name, value))
}

/// `--name=value` / `--name:value` where `--name` is a known option.
fn split_assignment<'a>(
    arg: &'a str,
    tree: &SymbolTree,
    scope: &[SymbolId],
) -> Option<(&'a str, &'a str)> {
    let idx = arg.find(['=', ':'])?;
    let (name, value) = (&arg[..idx], &arg[idx + 1..]);
    if name.is_empty() {
        return None;
    }
    tree.option_in_scope(scope, name)?;
    Some((name, value))
}

/// Split a short-option cluster like `-abc` or `-ofile`. Either every
/// character resolves to a known option or the cluster is left alone.
fn unbundle(arg: &str, tree: &SymbolTree, scope: &[SymbolId]) -> Option<Vec<(String, TokenType)>> {
    let rest = arg.strip_prefix('-')?;
    if rest.starts_with('-') || rest.chars().count() < 2 {
        return None;
    }

    let mut parts = Vec::new();
    for (idx, c) in rest.char_indices() {
        let alias = format!("-{c}");
        let option = tree.option_in_scope(scope, &alias)?;
        parts.push((alias, TokenType::Option));

        let arity = option.argument().arity();
        let tail = &rest[idx + c.len_utf8()..];
        if arity.min > 0 && !tail.is_empty() {
            parts.push((tail.to_string(), TokenType::Argument));
            break;
        }
    }
    Some(parts)
}
