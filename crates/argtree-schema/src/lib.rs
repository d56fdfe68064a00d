//! Declarative grammar files for `argtree`.
//!
//! A grammar file is a JSON document describing a command tree. It compiles
//! into an immutable [`argtree::SymbolTree`]:
//!
//! ```json
//! {
//!   "format-version": 1,
//!   "command": {
//!     "name": "tool",
//!     "options": [
//!       { "aliases": ["-v", "--verbose"] },
//!       { "aliases": ["--level"], "argument": { "value-type": "int", "default": 2 } }
//!     ],
//!     "commands": [
//!       { "name": "copy", "argument": { "value-type": "list<path>", "arity": { "min": 2 } } }
//!     ]
//!   }
//! }
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use argtree::symbol::remove_prefix;
use argtree::{
    Arity, ArgumentBuilder, ArgumentSpec, CommandBuilder, OptionBuilder, Symbol, SymbolTree,
    UNBOUNDED, Value, ValueType,
};
use serde::{Deserialize, Serialize};

/// The only grammar file format understood by this crate.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GrammarFile {
    pub format_version: u32,
    pub command: CommandDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct CommandDef {
    /// Primary alias; also the default display name.
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcommand_required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treat_unmatched_tokens_as_errors: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<ArgumentDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct OptionDef {
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<ArgumentDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ArgumentDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// `string`, `bool`, `int`, `float`, `path` or `list<...>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arity: Option<ArityDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub existing_files_only: bool,
    #[serde(default)]
    pub existing_directories_only: bool,
    #[serde(default)]
    pub legal_file_paths_only: bool,
}

/// Arity bounds; a missing `max` means unbounded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ArityDef {
    #[serde(default)]
    pub min: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<usize>,
}

impl From<Arity> for ArityDef {
    fn from(arity: Arity) -> Self {
        Self {
            min: arity.min,
            max: (!arity.is_unbounded()).then_some(arity.max),
        }
    }
}

impl GrammarFile {
    pub fn new(command: CommandDef) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            command,
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let grammar: Self = serde_json::from_str(text).context("invalid grammar JSON")?;
        if grammar.format_version != FORMAT_VERSION {
            bail!(
                "unsupported grammar format-version {} (expected {FORMAT_VERSION})",
                grammar.format_version
            );
        }
        Ok(grammar)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read grammar file: {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in grammar file: {}", path.display()))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize grammar")
    }

    /// Compile into a validated symbol tree.
    pub fn build(&self) -> Result<SymbolTree> {
        let tree = self
            .command
            .to_builder()?
            .build()
            .with_context(|| format!("invalid grammar for command '{}'", self.command.name))?;
        tracing::debug!(symbols = tree.len(), "compiled grammar");
        Ok(tree)
    }

    /// Describe an existing tree. Closures (converters, custom validators,
    /// dynamic suggestion sources, computed defaults) cannot be represented
    /// and are dropped.
    pub fn from_tree(tree: &SymbolTree) -> Self {
        Self::new(CommandDef::from_symbol(tree, tree.root()))
    }
}

impl CommandDef {
    pub fn to_builder(&self) -> Result<CommandBuilder> {
        let mut builder = CommandBuilder::new(&self.name)
            .description(&self.description)
            .hidden(self.hidden);
        for alias in &self.aliases {
            builder = builder.alias(alias);
        }
        if let Some(required) = self.subcommand_required {
            builder = builder.subcommand_required(required);
        }
        if let Some(strict) = self.treat_unmatched_tokens_as_errors {
            builder = builder.treat_unmatched_tokens_as_errors(strict);
        }
        if let Some(argument) = &self.argument {
            builder = builder.argument(
                argument
                    .to_builder()
                    .with_context(|| format!("argument of command '{}'", self.name))?,
            );
        }
        for option in &self.options {
            builder = builder.option(option.to_builder()?);
        }
        for command in &self.commands {
            builder = builder.subcommand(command.to_builder()?);
        }
        Ok(builder)
    }

    fn from_symbol(tree: &SymbolTree, symbol: &Symbol) -> Self {
        let mut def = Self {
            name: symbol.aliases()[0].clone(),
            aliases: symbol.aliases()[1..].to_vec(),
            description: symbol.description().to_string(),
            hidden: symbol.is_hidden(),
            subcommand_required: Some(symbol.subcommand_required()),
            treat_unmatched_tokens_as_errors: Some(symbol.treats_unmatched_tokens_as_errors()),
            argument: ArgumentDef::from_spec(symbol.argument()),
            ..Self::default()
        };
        for child in tree.children(symbol.id()) {
            if child.is_command() {
                def.commands.push(Self::from_symbol(tree, child));
            } else {
                def.options.push(OptionDef::from_symbol(child));
            }
        }
        def
    }
}

impl OptionDef {
    pub fn to_builder(&self) -> Result<OptionBuilder> {
        let mut builder = OptionBuilder::with_aliases(self.aliases.iter().cloned())
            .description(&self.description)
            .hidden(self.hidden);
        if let Some(name) = &self.name {
            builder = builder.name(name);
        }
        if let Some(argument) = &self.argument {
            let label = self.aliases.first().map(String::as_str).unwrap_or("?");
            builder = builder.argument(
                argument
                    .to_builder()
                    .with_context(|| format!("argument of option '{label}'"))?,
            );
        }
        Ok(builder)
    }

    fn from_symbol(symbol: &Symbol) -> Self {
        let mut derived = "";
        for alias in symbol.aliases() {
            let bare = remove_prefix(alias);
            if bare.len() > derived.len() {
                derived = bare;
            }
        }
        Self {
            aliases: symbol.aliases().to_vec(),
            name: (symbol.name() != derived).then(|| symbol.name().to_string()),
            description: symbol.description().to_string(),
            hidden: symbol.is_hidden(),
            argument: ArgumentDef::from_spec(symbol.argument()),
        }
    }
}

impl ArgumentDef {
    pub fn to_builder(&self) -> Result<ArgumentBuilder> {
        let value_type = match &self.value_type {
            Some(raw) => match ValueType::from_name(raw) {
                Some(ty) => Some(ty),
                None => bail!("unknown value-type '{raw}'"),
            },
            None => None,
        };

        let mut builder = ArgumentBuilder::new().description(&self.description);
        if let Some(name) = &self.name {
            builder = builder.name(name);
        }
        if let Some(ty) = &value_type {
            builder = builder.of_type(ty.clone());
        }
        if let Some(arity) = self.arity {
            builder = builder.arity(arity.min, arity.max.unwrap_or(UNBOUNDED));
        }
        if let Some(default) = &self.default {
            builder = builder.default_value(json_to_value(default, value_type.as_ref())?);
        }
        if !self.allowed_values.is_empty() {
            builder = builder.from_among(self.allowed_values.iter().cloned());
        }
        if !self.suggestions.is_empty() {
            builder = builder.suggestions(self.suggestions.iter().cloned());
        }
        if self.existing_files_only {
            builder = builder.existing_files_only();
        }
        if self.existing_directories_only {
            builder = builder.existing_directories_only();
        }
        if self.legal_file_paths_only {
            builder = builder.legal_file_paths_only();
        }
        Ok(builder)
    }

    fn from_spec(spec: &ArgumentSpec) -> Option<Self> {
        if !spec.arity().takes_values() && spec.value_type().is_none() {
            return None;
        }
        Some(Self {
            name: spec.name().map(str::to_string),
            description: spec.description().to_string(),
            value_type: spec.value_type().map(ValueType::name),
            arity: Some(spec.arity().into()),
            default: spec.default_value().and_then(|v| value_to_json(&v)),
            allowed_values: spec.allowed_values().map(str::to_string).collect(),
            suggestions: spec.suggestions().to_vec(),
            ..Self::default()
        })
    }
}

fn json_to_value(json: &serde_json::Value, ty: Option<&ValueType>) -> Result<Value> {
    use serde_json::Value as Json;

    let value = match (json, ty) {
        (Json::String(text), Some(ty)) => match ty.convert(text) {
            Ok(value) => value,
            Err(message) => bail!("invalid default value: {message}"),
        },
        (Json::String(text), None) => Value::Str(text.clone()),
        (Json::Bool(b), _) => Value::Bool(*b),
        (Json::Number(n), Some(ty)) if *ty.element() == ValueType::Float => match n.as_f64() {
            Some(f) => Value::Float(f),
            None => bail!("invalid default value: {n}"),
        },
        (Json::Number(n), _) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Value::Int(i),
            (None, Some(f)) => Value::Float(f),
            _ => bail!("invalid default value: {n}"),
        },
        (Json::Array(items), ty) => {
            let element = ty.map(ValueType::element);
            Value::List(
                items
                    .iter()
                    .map(|item| json_to_value(item, element))
                    .collect::<Result<_>>()?,
            )
        }
        (Json::Null, _) | (Json::Object(_), _) => {
            bail!("default value must be a string, number, boolean or array")
        }
    };

    let Some(ty) = ty else { return Ok(value) };
    if value.conforms_to(ty) {
        return Ok(value);
    }
    // A single element is accepted for a list type.
    if let ValueType::List(inner) = ty
        && value.conforms_to(inner)
    {
        return Ok(Value::List(vec![value]));
    }
    bail!("invalid default value {json}: expected {ty}")
}

/// JSON form of a parsed value; `None` for [`Value::Unit`].
pub fn value_to_json(value: &Value) -> Option<serde_json::Value> {
    use serde_json::Value as Json;

    Some(match value {
        Value::Unit => return None,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::Float(f) => Json::from(*f),
        Value::Str(s) => Json::String(s.clone()),
        Value::Path(p) => Json::String(p.display().to_string()),
        Value::List(items) => Json::Array(items.iter().filter_map(value_to_json).collect()),
    })
}
