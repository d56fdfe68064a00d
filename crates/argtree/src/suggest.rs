//! Completion candidates for partial input.

use std::collections::BTreeSet;
use std::collections::btree_set;

use crate::symbol::{SymbolId, SymbolTree};
use crate::token::{TokenType, split_command_line};
use crate::tokenizer::tokenize;

/// Lazily computed, sorted and deduplicated suggestions.
///
/// Nothing is computed until [`Suggestions::iter`] is called, and every call
/// starts over, so the sequence can be walked any number of times.
#[derive(Debug, Clone)]
pub struct Suggestions<'a> {
    tree: &'a SymbolTree,
    prefix: String,
}

impl<'a> Suggestions<'a> {
    /// Suggestions for `input` with the cursor at character `position`.
    pub fn new(tree: &'a SymbolTree, input: &str, position: usize) -> Self {
        let prefix = match input.char_indices().nth(position) {
            Some((byte, _)) => &input[..byte],
            None => input,
        };
        Self {
            tree,
            prefix: prefix.to_string(),
        }
    }

    pub fn iter(&self) -> btree_set::IntoIter<String> {
        self.candidates().into_iter()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.iter().collect()
    }

    fn candidates(&self) -> BTreeSet<String> {
        let mut args = split_command_line(&self.prefix);
        let text_to_match = if self.prefix.is_empty() || self.prefix.ends_with(char::is_whitespace)
        {
            String::new()
        } else {
            args.pop().unwrap_or_default()
        };

        let (command, open) = self.walk(&args);
        let mut out = BTreeSet::new();

        if let Some((option, taken)) = open {
            let spec = self.tree.get(option).argument();
            out.extend(spec.suggest(&text_to_match));
            if taken < spec.arity().min {
                out.retain(|c| c.contains(text_to_match.as_str()));
                return out;
            }
        }

        for child in self.tree.children(command).filter(|c| !c.is_hidden()) {
            out.extend(child.aliases().iter().cloned());
        }
        out.extend(self.tree.get(command).argument().suggest(&text_to_match));
        out.retain(|c| c.contains(text_to_match.as_str()));
        out
    }

    /// Innermost command and the still-open option (with its token count),
    /// following the same scoping rules as the matcher.
    fn walk(&self, args: &[String]) -> (SymbolId, Option<(SymbolId, usize)>) {
        let tree = self.tree;
        let mut scope = vec![tree.root().id()];
        let mut open: Option<(SymbolId, usize)> = None;

        for token in tokenize(args, tree).tokens {
            let current = scope[scope.len() - 1];
            match token.token_type() {
                TokenType::Command => {
                    if let Some(child) = tree.child_command(current, token.value()) {
                        scope.push(child.id());
                        open = None;
                    }
                }
                TokenType::Option => {
                    open = tree
                        .option_in_scope(&scope, token.value())
                        .filter(|o| o.argument().arity().takes_values())
                        .map(|o| (o.id(), 0));
                }
                TokenType::Argument => {
                    if let Some((option, taken)) = open.as_mut() {
                        *taken += 1;
                        if *taken >= tree.get(*option).argument().arity().max {
                            open = None;
                        }
                    }
                }
                TokenType::EndOfOptions => open = None,
                TokenType::Directive | TokenType::Unparsed => {}
            }
        }
        (scope[scope.len() - 1], open)
    }
}

impl<'s, 'a> IntoIterator for &'s Suggestions<'a> {
    type Item = String;
    type IntoIter = btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::{ArgumentBuilder, ValueType};
    use crate::symbol::{CommandBuilder, OptionBuilder};

    fn tree() -> SymbolTree {
        CommandBuilder::new("tool")
            .option(OptionBuilder::new("--verbose"))
            .option(OptionBuilder::new("--secret").hidden(true))
            .option(
                OptionBuilder::new("--color").argument(
                    ArgumentBuilder::of(ValueType::String).from_among(["always", "never", "auto"]),
                ),
            )
            .option(OptionBuilder::new("--fast").argument(ArgumentBuilder::of(ValueType::Bool)))
            .subcommand(CommandBuilder::new("build"))
            .subcommand(CommandBuilder::new("bench"))
            .subcommand_required(false)
            .build()
            .unwrap()
    }

    #[test]
    fn lists_visible_children_in_order() {
        let tree = tree();
        let got = Suggestions::new(&tree, "", 0).to_vec();
        assert_eq!(got, vec!["--color", "--fast", "--verbose", "bench", "build"]);
    }

    #[test]
    fn filters_on_the_token_under_the_cursor() {
        let tree = tree();
        assert_eq!(Suggestions::new(&tree, "be", 2).to_vec(), vec!["bench"]);
        assert_eq!(Suggestions::new(&tree, "bu", 2).to_vec(), vec!["build"]);
        // Only the text left of the cursor counts.
        assert_eq!(Suggestions::new(&tree, "build", 2).to_vec(), vec!["build"]);
        assert_eq!(
            Suggestions::new(&tree, "b", 1).to_vec(),
            vec!["--verbose", "bench", "build"]
        );
    }

    #[test]
    fn open_option_with_required_value_only_offers_values() {
        let tree = tree();
        let got = Suggestions::new(&tree, "--color ", 8).to_vec();
        assert_eq!(got, vec!["always", "auto", "never"]);
        let got = Suggestions::new(&tree, "--color a", 9).to_vec();
        assert_eq!(got, vec!["always", "auto"]);
    }

    #[test]
    fn optional_values_are_mixed_with_children() {
        let tree = tree();
        let got = Suggestions::new(&tree, "--fast ", 7).to_vec();
        assert!(got.contains(&"true".to_string()));
        assert!(got.contains(&"build".to_string()));
    }

    #[test]
    fn suggestions_can_be_walked_twice() {
        let tree = tree();
        let suggestions = Suggestions::new(&tree, "--", 2);
        let first: Vec<_> = suggestions.iter().collect();
        let second: Vec<_> = (&suggestions).into_iter().collect();
        assert_eq!(first, second);
        assert!(!first.contains(&"--secret".to_string()));
    }
}
