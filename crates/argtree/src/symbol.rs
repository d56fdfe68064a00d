//! The symbol tree: an immutable, declarative model of commands and options.
//!
//! Trees are assembled with [`CommandBuilder`] / [`OptionBuilder`] and frozen
//! by [`CommandBuilder::build`], which performs every alias and arity check
//! up front. Once built, a [`SymbolTree`] is never mutated and can be shared
//! across threads by any number of concurrent parses.

use std::collections::HashMap;

use thiserror::Error;

use crate::argument::{ArgumentBuilder, ArgumentSpec};

/// Fatal tree-construction errors (programmer misuse, not user input).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("a symbol must have at least one alias")]
    NoAliases,

    #[error("an alias cannot be empty or consist entirely of whitespace: {0:?}")]
    EmptyAlias(String),

    #[error("alias {0:?} has leading or trailing whitespace")]
    AliasWhitespace(String),

    #[error("alias {alias:?} is registered twice on '{symbol}'")]
    DuplicateAlias { alias: String, symbol: String },

    #[error("alias {alias:?} is used by both '{first}' and '{second}' under '{parent}'")]
    AliasCollision {
        alias: String,
        first: String,
        second: String,
        parent: String,
    },

    #[error("symbol name cannot be empty or whitespace")]
    EmptyName,

    #[error("symbol name {0:?} cannot have a prefix")]
    PrefixedName(String),

    #[error("invalid arity: minimum {min} exceeds maximum {max}")]
    InvalidArity { min: usize, max: usize },
}

/// Index of a symbol inside its [`SymbolTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub(crate) usize);

impl SymbolId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Command {
        subcommand_required: bool,
        treat_unmatched_tokens_as_errors: bool,
    },
    Option,
}

/// Descriptive metadata consumed by help renderers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpDetail {
    pub name: String,
    pub description: String,
    pub hidden: bool,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    id: SymbolId,
    kind: SymbolKind,
    aliases: Vec<String>,
    name: String,
    description: String,
    argument: ArgumentSpec,
    help: HelpDetail,
    parent: Option<SymbolId>,
    children: Vec<SymbolId>,
}

impl Symbol {
    pub fn id(&self) -> SymbolId {
        self.id
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    pub fn is_command(&self) -> bool {
        matches!(self.kind, SymbolKind::Command { .. })
    }

    pub fn is_option(&self) -> bool {
        matches!(self.kind, SymbolKind::Option)
    }

    /// Raw aliases, prefixes included, in registration order.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Display name: the explicit name, or the longest prefix-stripped alias.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Longest raw alias, used when quoting the symbol in diagnostics.
    pub fn display_alias(&self) -> &str {
        let mut best = self.aliases[0].as_str();
        for alias in &self.aliases[1..] {
            if alias.len() > best.len() {
                best = alias;
            }
        }
        best
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn argument(&self) -> &ArgumentSpec {
        &self.argument
    }

    pub fn help(&self) -> &HelpDetail {
        &self.help
    }

    pub fn is_hidden(&self) -> bool {
        self.help.hidden
    }

    pub fn parent(&self) -> Option<SymbolId> {
        self.parent
    }

    pub fn children(&self) -> &[SymbolId] {
        &self.children
    }

    /// Match against prefix-stripped aliases (`x`, `-x` and `--x` are equal).
    pub fn has_alias(&self, alias: &str) -> bool {
        let wanted = remove_prefix(alias);
        self.aliases.iter().any(|a| remove_prefix(a) == wanted)
    }

    /// Exact match against the raw aliases.
    pub fn has_raw_alias(&self, alias: &str) -> bool {
        self.aliases.iter().any(|a| a == alias)
    }

    pub fn subcommand_required(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::Command {
                subcommand_required: true,
                ..
            }
        )
    }

    pub fn treats_unmatched_tokens_as_errors(&self) -> bool {
        match self.kind {
            SymbolKind::Command {
                treat_unmatched_tokens_as_errors,
                ..
            } => treat_unmatched_tokens_as_errors,
            SymbolKind::Option => true,
        }
    }
}

/// Strip a leading `--`, `-` or `/` from an alias.
pub fn remove_prefix(alias: &str) -> &str {
    alias
        .strip_prefix("--")
        .or_else(|| alias.strip_prefix('-'))
        .or_else(|| alias.strip_prefix('/'))
        .unwrap_or(alias)
}

/// A frozen symbol tree. The root command is always at index 0.
#[derive(Debug, Clone)]
pub struct SymbolTree {
    symbols: Vec<Symbol>,
}

impl SymbolTree {
    pub fn root(&self) -> &Symbol {
        &self.symbols[0]
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn children(&self, id: SymbolId) -> impl Iterator<Item = &Symbol> {
        self.get(id).children.iter().map(|c| self.get(*c))
    }

    pub fn parent(&self, id: SymbolId) -> Option<&Symbol> {
        self.get(id).parent.map(|p| self.get(p))
    }

    /// Child command of `command` whose raw alias equals `raw`.
    pub fn child_command(&self, command: SymbolId, raw: &str) -> Option<&Symbol> {
        self.children(command)
            .find(|s| s.is_command() && s.has_raw_alias(raw))
    }

    /// Option reachable from the command scope `scope` (outermost first);
    /// inner commands shadow outer ones.
    pub fn option_in_scope(&self, scope: &[SymbolId], raw: &str) -> Option<&Symbol> {
        scope.iter().rev().find_map(|command| {
            self.children(*command)
                .find(|s| s.is_option() && s.has_raw_alias(raw))
        })
    }

    /// Depth-first search for a symbol by prefix-insensitive alias.
    pub fn find(&self, alias: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.has_alias(alias))
    }
}

enum Child {
    Command(CommandBuilder),
    Option(OptionBuilder),
}

/// Builder for a command node and, transitively, its whole subtree.
pub struct CommandBuilder {
    aliases: Vec<String>,
    name: Option<String>,
    description: String,
    hidden: bool,
    argument: Option<ArgumentBuilder>,
    subcommand_required: Option<bool>,
    treat_unmatched_tokens_as_errors: bool,
    children: Vec<Child>,
}

impl CommandBuilder {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            aliases: vec![alias.into()],
            name: None,
            description: String::new(),
            hidden: false,
            argument: None,
            subcommand_required: None,
            treat_unmatched_tokens_as_errors: true,
            children: Vec::new(),
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Positional values collected by this command.
    pub fn argument(mut self, argument: ArgumentBuilder) -> Self {
        self.argument = Some(argument);
        self
    }

    pub fn option(mut self, option: OptionBuilder) -> Self {
        self.children.push(Child::Option(option));
        self
    }

    pub fn subcommand(mut self, command: CommandBuilder) -> Self {
        self.children.push(Child::Command(command));
        self
    }

    /// Defaults to `true` when the command has subcommands.
    pub fn subcommand_required(mut self, required: bool) -> Self {
        self.subcommand_required = Some(required);
        self
    }

    pub fn treat_unmatched_tokens_as_errors(mut self, value: bool) -> Self {
        self.treat_unmatched_tokens_as_errors = value;
        self
    }

    /// Validate the whole tree and freeze it.
    pub fn build(self) -> Result<SymbolTree, BuildError> {
        let mut assembler = Assembler::default();
        assembler.add_command(self, None)?;
        tracing::debug!(symbols = assembler.symbols.len(), "built symbol tree");
        Ok(SymbolTree {
            symbols: assembler.symbols,
        })
    }
}

/// Builder for an option node.
pub struct OptionBuilder {
    aliases: Vec<String>,
    name: Option<String>,
    description: String,
    hidden: bool,
    argument: Option<ArgumentBuilder>,
}

impl OptionBuilder {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            aliases: vec![alias.into()],
            name: None,
            description: String::new(),
            hidden: false,
            argument: None,
        }
    }

    pub fn with_aliases<I, S>(aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            aliases: aliases.into_iter().map(Into::into).collect(),
            ..Self::new(String::new())
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn argument(mut self, argument: ArgumentBuilder) -> Self {
        self.argument = Some(argument);
        self
    }
}

#[derive(Default)]
struct Assembler {
    symbols: Vec<Symbol>,
}

struct Common {
    aliases: Vec<String>,
    name: Option<String>,
    description: String,
    hidden: bool,
}

impl Assembler {
    fn add_command(
        &mut self,
        builder: CommandBuilder,
        parent: Option<SymbolId>,
    ) -> Result<SymbolId, BuildError> {
        let has_subcommands = builder
            .children
            .iter()
            .any(|c| matches!(c, Child::Command(_)));
        let kind = SymbolKind::Command {
            subcommand_required: builder.subcommand_required.unwrap_or(has_subcommands),
            treat_unmatched_tokens_as_errors: builder.treat_unmatched_tokens_as_errors,
        };
        let argument = builder.argument.unwrap_or_default().build(true)?;
        let common = Common {
            aliases: builder.aliases,
            name: builder.name,
            description: builder.description,
            hidden: builder.hidden,
        };
        let id = self.push(kind, common, argument, parent)?;

        let mut seen: HashMap<String, String> = HashMap::new();
        for child in builder.children {
            let child_id = match child {
                Child::Command(c) => self.add_command(c, Some(id))?,
                Child::Option(o) => self.add_option(o, id)?,
            };
            self.check_siblings(id, child_id, &mut seen)?;
            self.symbols[id.0].children.push(child_id);
        }
        Ok(id)
    }

    fn add_option(
        &mut self,
        builder: OptionBuilder,
        parent: SymbolId,
    ) -> Result<SymbolId, BuildError> {
        let argument = builder.argument.unwrap_or_default().build(false)?;
        let common = Common {
            aliases: builder.aliases,
            name: builder.name,
            description: builder.description,
            hidden: builder.hidden,
        };
        self.push(SymbolKind::Option, common, argument, Some(parent))
    }

    fn push(
        &mut self,
        kind: SymbolKind,
        common: Common,
        argument: ArgumentSpec,
        parent: Option<SymbolId>,
    ) -> Result<SymbolId, BuildError> {
        if common.aliases.is_empty() {
            return Err(BuildError::NoAliases);
        }

        let mut stripped: Vec<&str> = Vec::with_capacity(common.aliases.len());
        let mut longest = "";
        for alias in &common.aliases {
            if alias.trim() != alias.as_str() && !alias.trim().is_empty() {
                return Err(BuildError::AliasWhitespace(alias.clone()));
            }
            let bare = remove_prefix(alias);
            if bare.trim().is_empty() {
                return Err(BuildError::EmptyAlias(alias.clone()));
            }
            if stripped.contains(&bare) {
                return Err(BuildError::DuplicateAlias {
                    alias: alias.clone(),
                    symbol: common.aliases[0].clone(),
                });
            }
            stripped.push(bare);
            if bare.len() > longest.len() {
                longest = bare;
            }
        }

        let name = match common.name {
            Some(name) => {
                if name.trim().is_empty() {
                    return Err(BuildError::EmptyName);
                }
                if remove_prefix(&name) != name {
                    return Err(BuildError::PrefixedName(name));
                }
                name
            }
            None => longest.to_string(),
        };

        let id = SymbolId(self.symbols.len());
        self.symbols.push(Symbol {
            id,
            kind,
            help: HelpDetail {
                name: name.clone(),
                description: common.description.clone(),
                hidden: common.hidden,
            },
            aliases: common.aliases,
            name,
            description: common.description,
            argument,
            parent,
            children: Vec::new(),
        });
        Ok(id)
    }

    fn check_siblings(
        &self,
        parent: SymbolId,
        child: SymbolId,
        seen: &mut HashMap<String, String>,
    ) -> Result<(), BuildError> {
        let child = &self.symbols[child.0];
        for alias in &child.aliases {
            let bare = remove_prefix(alias).to_string();
            if let Some(first) = seen.insert(bare, child.name.clone()) {
                return Err(BuildError::AliasCollision {
                    alias: alias.clone(),
                    first,
                    second: child.name.clone(),
                    parent: self.symbols[parent.0].name.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::ValueType;

    #[test]
    fn longest_alias_becomes_the_name() {
        let tree = CommandBuilder::new("root")
            .option(OptionBuilder::new("-s").alias("--string"))
            .build()
            .unwrap();
        let option = tree.children(tree.root().id()).next().unwrap();
        assert_eq!(option.name(), "string");
        assert_eq!(option.display_alias(), "--string");
        assert_eq!(option.parent(), Some(tree.root().id()));
        assert!(option.has_alias("string"));
        assert!(option.has_alias("-string"));
        assert!(!option.has_raw_alias("string"));
    }

    #[test]
    fn explicit_name_wins_and_must_be_unprefixed() {
        let tree = CommandBuilder::new("root")
            .option(OptionBuilder::new("--output").name("out"))
            .build()
            .unwrap();
        assert_eq!(tree.find("--output").unwrap().name(), "out");

        let err = CommandBuilder::new("root")
            .option(OptionBuilder::new("--output").name("--out"))
            .build()
            .unwrap_err();
        assert_eq!(err, BuildError::PrefixedName("--out".to_string()));
    }

    #[test]
    fn sibling_aliases_must_be_disjoint_after_prefix_stripping() {
        let err = CommandBuilder::new("root")
            .option(OptionBuilder::new("-x"))
            .option(OptionBuilder::new("--x"))
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::AliasCollision { .. }), "{err}");

        let err = CommandBuilder::new("root")
            .subcommand(CommandBuilder::new("build"))
            .option(OptionBuilder::new("--build"))
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::AliasCollision { .. }), "{err}");
    }

    #[test]
    fn same_alias_in_different_subtrees_is_fine() {
        let tree = CommandBuilder::new("root")
            .subcommand(CommandBuilder::new("a").option(OptionBuilder::new("--verbose")))
            .subcommand(CommandBuilder::new("b").option(OptionBuilder::new("--verbose")))
            .build();
        assert!(tree.is_ok());
    }

    #[test]
    fn bad_aliases_are_rejected() {
        let err = CommandBuilder::new("root")
            .option(OptionBuilder::new("--"))
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::EmptyAlias(_)));

        let err = CommandBuilder::new("root")
            .option(OptionBuilder::new(" -x"))
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::AliasWhitespace(_)));

        let err = CommandBuilder::new("root")
            .option(OptionBuilder::new("-x").alias("--x"))
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::DuplicateAlias { .. }));

        let err = CommandBuilder::new("root")
            .option(OptionBuilder::with_aliases(Vec::<String>::new()))
            .build()
            .unwrap_err();
        assert_eq!(err, BuildError::NoAliases);
    }

    #[test]
    fn invalid_arity_fails_the_build() {
        let err = CommandBuilder::new("root")
            .option(OptionBuilder::new("-n").argument(
                ArgumentBuilder::of(ValueType::Int).arity(3, 2),
            ))
            .build()
            .unwrap_err();
        assert_eq!(err, BuildError::InvalidArity { min: 3, max: 2 });
    }

    #[test]
    fn subcommand_requirement_defaults_to_having_subcommands() {
        let tree = CommandBuilder::new("root")
            .subcommand(CommandBuilder::new("leaf"))
            .build()
            .unwrap();
        assert!(tree.root().subcommand_required());
        assert!(!tree.find("leaf").unwrap().subcommand_required());

        let tree = CommandBuilder::new("root")
            .subcommand(CommandBuilder::new("leaf"))
            .subcommand_required(false)
            .build()
            .unwrap();
        assert!(!tree.root().subcommand_required());
    }

    #[test]
    fn options_are_found_through_enclosing_scopes() {
        let tree = CommandBuilder::new("root")
            .option(OptionBuilder::new("--verbose"))
            .subcommand(CommandBuilder::new("run").option(OptionBuilder::new("--fast")))
            .build()
            .unwrap();
        let root = tree.root().id();
        let run = tree.child_command(root, "run").unwrap().id();
        assert!(tree.option_in_scope(&[root, run], "--verbose").is_some());
        assert!(tree.option_in_scope(&[root, run], "--fast").is_some());
        assert!(tree.option_in_scope(&[root], "--fast").is_none());
    }

    #[test]
    fn trees_are_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SymbolTree>();
    }
}
