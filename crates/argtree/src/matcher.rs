//! Token sequence × symbol tree → result arena.
//!
//! A single forward pass keeps the matched command path as a stack and at
//! most one open option. A token offered to the open option is checked
//! immediately; if the option rejects it in a retryable way the token is
//! taken back and offered to the innermost command instead.

use crate::messages;
use crate::resolve;
use crate::result::{ParseError, ParseErrorKind, ResultId, ResultKind, SymbolResult};
use crate::symbol::{SymbolId, SymbolTree};
use crate::token::{Token, TokenType};

pub(crate) struct Matched {
    pub(crate) results: Vec<SymbolResult>,
    pub(crate) command: ResultId,
    pub(crate) unmatched: Vec<Token>,
    pub(crate) errors: Vec<ParseError>,
}

pub(crate) fn match_tokens(tree: &SymbolTree, tokens: &[Token]) -> Matched {
    let mut matcher = Matcher::new(tree);
    for token in tokens {
        matcher.feed(token);
    }
    matcher.finish()
}

struct OpenOption {
    id: ResultId,
    limit: usize,
}

struct Matcher<'t> {
    tree: &'t SymbolTree,
    results: Vec<SymbolResult>,
    path: Vec<ResultId>,
    open: Option<OpenOption>,
    seen_input: bool,
    unmatched: Vec<Token>,
}

impl<'t> Matcher<'t> {
    fn new(tree: &'t SymbolTree) -> Self {
        let root = tree.root();
        let token = Token::implicit(root.aliases()[0].as_str(), TokenType::Command);
        Self {
            tree,
            results: vec![SymbolResult::new(
                ResultKind::Command,
                root.id(),
                token,
                None,
            )],
            path: vec![ResultId::ROOT],
            open: None,
            seen_input: false,
            unmatched: Vec::new(),
        }
    }

    fn innermost(&self) -> ResultId {
        self.path[self.path.len() - 1]
    }

    fn result(&mut self, id: ResultId) -> &mut SymbolResult {
        &mut self.results[id.0]
    }

    fn push(&mut self, result: SymbolResult) -> ResultId {
        let id = ResultId(self.results.len());
        if let Some(parent) = result.parent {
            self.result(parent).children.push(id);
        }
        self.results.push(result);
        id
    }

    fn feed(&mut self, token: &Token) {
        match token.token_type() {
            TokenType::Directive | TokenType::Unparsed => return,
            TokenType::EndOfOptions => self.open = None,
            TokenType::Command => self.command(token),
            TokenType::Option => self.option(token),
            TokenType::Argument => self.argument(token),
        }
        self.seen_input = true;
    }

    fn command(&mut self, token: &Token) {
        let tree = self.tree;
        let current = self.results[self.innermost().0].symbol;
        if let Some(child) = tree.child_command(current, token.value()) {
            let parent = self.innermost();
            let id = self.push(SymbolResult::new(
                ResultKind::Command,
                child.id(),
                token.clone(),
                Some(parent),
            ));
            self.path.push(id);
            self.open = None;
            tracing::trace!(command = child.name(), "entered command scope");
        } else if !self.seen_input && tree.root().has_raw_alias(token.value()) {
            self.result(ResultId::ROOT).token = token.clone();
        } else {
            self.argument(token);
        }
    }

    fn option(&mut self, token: &Token) {
        let tree = self.tree;
        let scope: Vec<SymbolId> = self
            .path
            .iter()
            .map(|id| self.results[id.0].symbol)
            .collect();
        let Some(option) = tree.option_in_scope(&scope, token.value()) else {
            self.argument(token);
            return;
        };
        let Some(owner) = self
            .path
            .iter()
            .rev()
            .copied()
            .find(|id| Some(self.results[id.0].symbol) == option.parent())
        else {
            self.argument(token);
            return;
        };

        let max = option.argument().arity().max;
        let existing = self.results[owner.0]
            .children
            .iter()
            .copied()
            .find(|id| self.results[id.0].symbol == option.id());

        self.open = Some(match existing {
            Some(id) => {
                // A repeated option admits one extra value so that the
                // overflow is reported against it.
                let taken = self.results[id.0].tokens.len();
                let limit = if max > 0 { max.max(taken.saturating_add(1)) } else { 0 };
                OpenOption { id, limit }
            }
            None => {
                let id = self.push(SymbolResult::new(
                    ResultKind::Option,
                    option.id(),
                    token.clone(),
                    Some(owner),
                ));
                OpenOption { id, limit: max }
            }
        });
    }

    fn argument(&mut self, token: &Token) {
        if let Some(open) = self.open.take() {
            let taken = self.results[open.id.0].tokens.len();
            if taken < open.limit {
                if self.offer_to_option(open.id, token) {
                    if taken + 1 < open.limit {
                        self.open = Some(open);
                    }
                    return;
                }
                self.open = Some(open);
            }
        }

        let command = self.innermost();
        let max = self.tree.get(self.results[command.0].symbol).argument().arity().max;
        if self.results[command.0].tokens.len() < max {
            self.result(command).tokens.push(token.clone());
            return;
        }

        self.unmatched.push(token.clone());
    }

    /// Tentatively append `token` to an option; keep it unless the option
    /// rejects it in a retryable way.
    fn offer_to_option(&mut self, id: ResultId, token: &Token) -> bool {
        let tree = self.tree;
        let symbol = tree.get(self.results[id.0].symbol);
        self.result(id).tokens.push(token.clone());

        let values: Vec<&str> = self.results[id.0].tokens.iter().map(Token::value).collect();
        match resolve::trial(symbol, &values) {
            Some(failure) if failure.can_retry_token => {
                self.result(id).tokens.pop();
                tracing::trace!(
                    token = token.value(),
                    option = symbol.name(),
                    "rolled back token"
                );
                false
            }
            _ => true,
        }
    }

    fn finish(mut self) -> Matched {
        self.inject_defaults();
        let tree = self.tree;

        let command = self.innermost();
        let mut errors = Vec::new();
        let symbol = tree.get(self.results[command.0].symbol);

        if !symbol.treats_unmatched_tokens_as_errors() && !self.unmatched.is_empty() {
            tracing::debug!(
                count = self.unmatched.len(),
                command = symbol.name(),
                "unmatched tokens tolerated"
            );
        } else {
            for token in &self.unmatched {
                errors.push(ParseError::new(
                    ParseErrorKind::UnrecognizedToken,
                    messages::unrecognized_command_or_argument(token.value()),
                    None,
                    Some(token.clone()),
                    false,
                ));
            }
        }

        let has_subcommands = tree.children(symbol.id()).any(|c| c.is_command());
        if symbol.subcommand_required() && has_subcommands {
            errors.push(ParseError::new(
                ParseErrorKind::RequiredSubcommandMissing,
                messages::required_command_not_provided(),
                Some(command),
                Some(self.results[command.0].token.clone()),
                false,
            ));
        }

        Matched {
            results: self.results,
            command,
            unmatched: self.unmatched,
            errors,
        }
    }

    /// Options with a default value that never appeared on the matched path
    /// get an implicit result so that lookups find the default.
    fn inject_defaults(&mut self) {
        for command in self.path.clone() {
            let symbol = self.results[command.0].symbol;
            let missing: Vec<_> = self
                .tree
                .children(symbol)
                .filter(|c| c.is_option() && c.argument().has_default_value())
                .filter(|c| {
                    !self.results[command.0]
                        .children
                        .iter()
                        .any(|id| self.results[id.0].symbol == c.id())
                })
                .map(|c| (c.id(), c.display_alias().to_string()))
                .collect();

            for (option, alias) in missing {
                let mut result = SymbolResult::new(
                    ResultKind::Option,
                    option,
                    Token::implicit(alias, TokenType::Option),
                    Some(command),
                );
                result.implicit = true;
                self.push(result);
                tracing::trace!(option = option.index(), "injected default option");
            }
        }
    }
}
