//! Argument specifications: arity, value types, conversion, validators and
//! suggestion sources.
//!
//! An [`ArgumentSpec`] is built once while the symbol tree is assembled and is
//! shared, read-only, by every parse that touches its owning symbol.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexSet;

use crate::messages;
use crate::result::ResultRef;
use crate::symbol::BuildError;

/// Upper bound used for arities without a maximum.
pub const UNBOUNDED: usize = usize::MAX;

/// How many value tokens a symbol may consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Arity {
    pub min: usize,
    pub max: usize,
}

impl Arity {
    pub const ZERO: Arity = Arity { min: 0, max: 0 };
    pub const ZERO_OR_ONE: Arity = Arity { min: 0, max: 1 };
    pub const EXACTLY_ONE: Arity = Arity { min: 1, max: 1 };
    pub const ZERO_OR_MORE: Arity = Arity {
        min: 0,
        max: UNBOUNDED,
    };
    pub const ONE_OR_MORE: Arity = Arity {
        min: 1,
        max: UNBOUNDED,
    };

    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn is_unbounded(&self) -> bool {
        self.max == UNBOUNDED
    }

    pub fn takes_values(&self) -> bool {
        self.max > 0
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unbounded() {
            write!(f, "{}..", self.min)
        } else {
            write!(f, "{}..={}", self.min, self.max)
        }
    }
}

/// Declared type of an argument's values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Bool,
    Int,
    Float,
    Path,
    List(Box<ValueType>),
}

impl ValueType {
    pub fn list_of(inner: ValueType) -> Self {
        Self::List(Box::new(inner))
    }

    pub fn name(&self) -> String {
        match self {
            Self::String => "string".to_string(),
            Self::Bool => "bool".to_string(),
            Self::Int => "int".to_string(),
            Self::Float => "float".to_string(),
            Self::Path => "path".to_string(),
            Self::List(inner) => format!("list<{}>", inner.name()),
        }
    }

    /// Parse a type name as written in grammar files (`int`, `list<path>`, ...).
    pub fn from_name(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Some(inner) = raw
            .strip_prefix("list<")
            .and_then(|rest| rest.strip_suffix('>'))
        {
            return Self::from_name(inner).map(Self::list_of);
        }
        match raw {
            "string" | "str" => Some(Self::String),
            "bool" | "boolean" => Some(Self::Bool),
            "int" | "integer" => Some(Self::Int),
            "float" | "number" => Some(Self::Float),
            "path" | "file" => Some(Self::Path),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Arity used when none was declared explicitly.
    pub fn default_arity(&self, for_command: bool) -> Arity {
        match self {
            Self::Bool => Arity::ZERO_OR_ONE,
            Self::List(_) if for_command => Arity::ZERO_OR_MORE,
            Self::List(_) => Arity::ONE_OR_MORE,
            _ => Arity::EXACTLY_ONE,
        }
    }

    /// Element type used when converting each token of a multi-valued argument.
    pub fn element(&self) -> &ValueType {
        match self {
            Self::List(inner) => inner,
            other => other,
        }
    }

    /// Convert a single raw token.
    pub fn convert(&self, raw: &str) -> Result<Value, String> {
        let fail = || messages::cannot_parse(raw, &self.name());
        match self {
            Self::String => Ok(Value::Str(raw.to_string())),
            Self::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(fail()),
            },
            Self::Int => raw.trim().parse().map(Value::Int).map_err(|_| fail()),
            Self::Float => raw.trim().parse().map(Value::Float).map_err(|_| fail()),
            Self::Path => Ok(Value::Path(PathBuf::from(raw))),
            Self::List(inner) => inner.convert(raw).map(|v| Value::List(vec![v])),
        }
    }

    fn suggestions(&self) -> &'static [&'static str] {
        match self.element() {
            Self::Bool => &["false", "true"],
            _ => &[],
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// A converted argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Present without a value (flags, or an optional value that was omitted).
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Path(PathBuf),
    List(Vec<Value>),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(p) => Some(p.as_path()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Whether this value already has the shape of `ty`.
    pub fn conforms_to(&self, ty: &ValueType) -> bool {
        match (self, ty) {
            (Self::Bool(_), ValueType::Bool)
            | (Self::Int(_), ValueType::Int)
            | (Self::Float(_), ValueType::Float)
            | (Self::Str(_), ValueType::String)
            | (Self::Path(_), ValueType::Path) => true,
            (Self::List(items), ValueType::List(inner)) => {
                items.iter().all(|item| item.conforms_to(inner))
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

/// Custom validator run against a fully resolved symbol result.
///
/// Returning `Some(message)` with a non-blank message fails validation.
pub trait Validator: Send + Sync {
    fn validate(&self, result: ResultRef<'_>) -> Option<String>;
}

impl<F> Validator for F
where
    F: Fn(ResultRef<'_>) -> Option<String> + Send + Sync,
{
    fn validate(&self, result: ResultRef<'_>) -> Option<String> {
        self(result)
    }
}

/// Dynamic completion candidates for an argument.
pub trait SuggestionSource: Send + Sync {
    fn suggest(&self, text_to_match: &str) -> Vec<String>;
}

impl<F> SuggestionSource for F
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn suggest(&self, text_to_match: &str) -> Vec<String> {
        self(text_to_match)
    }
}

type DefaultFn = dyn Fn() -> Value + Send + Sync;
type ConvertFn = dyn Fn(&[&str]) -> Result<Value, String> + Send + Sync;

/// Immutable argument specification attached to a command or option.
#[derive(Clone)]
pub struct ArgumentSpec {
    name: Option<String>,
    description: String,
    value_type: Option<ValueType>,
    arity: Arity,
    default_value: Option<Arc<DefaultFn>>,
    converter: Option<Arc<ConvertFn>>,
    validators: Vec<Arc<dyn Validator>>,
    allowed_values: IndexSet<String>,
    suggestions: Vec<String>,
    suggestion_sources: Vec<Arc<dyn SuggestionSource>>,
}

impl ArgumentSpec {
    /// The spec used by symbols that take no values.
    pub fn none() -> Self {
        Self {
            name: None,
            description: String::new(),
            value_type: None,
            arity: Arity::ZERO,
            default_value: None,
            converter: None,
            validators: Vec::new(),
            allowed_values: IndexSet::new(),
            suggestions: Vec::new(),
            suggestion_sources: Vec::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn value_type(&self) -> Option<&ValueType> {
        self.value_type.as_ref()
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn has_default_value(&self) -> bool {
        self.default_value.is_some()
    }

    /// Evaluate the default supplier, if any.
    pub fn default_value(&self) -> Option<Value> {
        self.default_value.as_ref().map(|f| f())
    }

    pub fn allowed_values(&self) -> impl Iterator<Item = &str> {
        self.allowed_values.iter().map(String::as_str)
    }

    /// Fixed suggestions registered with [`ArgumentBuilder::suggestions`].
    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub(crate) fn allows(&self, raw: &str) -> bool {
        self.allowed_values.is_empty() || self.allowed_values.contains(raw)
    }

    pub(crate) fn validators(&self) -> &[Arc<dyn Validator>] {
        &self.validators
    }

    /// A single-valued boolean: presence alone means `true`.
    pub fn is_flag_like(&self) -> bool {
        self.arity.max == 1 && self.value_type.as_ref() == Some(&ValueType::Bool)
    }

    /// Apply the declared converter to the collected tokens.
    pub(crate) fn convert(&self, tokens: &[&str]) -> Result<Value, String> {
        if self.arity.max == 0 {
            return Ok(Value::Unit);
        }
        if let Some(convert) = &self.converter {
            return convert(tokens);
        }
        let ty = self.value_type.clone().unwrap_or(ValueType::String);
        if self.arity.max == 1 {
            return match tokens.first() {
                Some(raw) => ty.convert(raw),
                None => Ok(Value::Unit),
            };
        }
        let element = ty.element();
        tokens
            .iter()
            .map(|raw| element.convert(raw))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }

    /// Fixed, allowed-value, dynamic and type-driven candidates, unfiltered.
    pub(crate) fn suggest(&self, text_to_match: &str) -> Vec<String> {
        let mut out: Vec<String> = self.suggestions.clone();
        out.extend(self.allowed_values.iter().cloned());
        for source in &self.suggestion_sources {
            out.extend(source.suggest(text_to_match));
        }
        if let Some(ty) = &self.value_type {
            out.extend(ty.suggestions().iter().map(|s| s.to_string()));
        }
        out
    }
}

impl fmt::Debug for ArgumentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentSpec")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("arity", &self.arity)
            .field("has_default", &self.default_value.is_some())
            .field("custom_converter", &self.converter.is_some())
            .field("validators", &self.validators.len())
            .field("allowed_values", &self.allowed_values)
            .field("suggestions", &self.suggestions)
            .finish()
    }
}

/// Accumulates an argument's configuration; turned into an [`ArgumentSpec`]
/// when the owning tree is built.
#[derive(Clone, Default)]
pub struct ArgumentBuilder {
    name: Option<String>,
    description: String,
    value_type: Option<ValueType>,
    arity: Option<Arity>,
    default_value: Option<Arc<DefaultFn>>,
    converter: Option<Arc<ConvertFn>>,
    validators: Vec<Arc<dyn Validator>>,
    allowed_values: IndexSet<String>,
    suggestions: Vec<String>,
    suggestion_sources: Vec<Arc<dyn SuggestionSource>>,
}

impl ArgumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for `ArgumentBuilder::new().of_type(ty)`.
    pub fn of(ty: ValueType) -> Self {
        Self::new().of_type(ty)
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn of_type(mut self, ty: ValueType) -> Self {
        self.value_type = Some(ty);
        self
    }

    pub fn arity(mut self, min: usize, max: usize) -> Self {
        self.arity = Some(Arity::new(min, max));
        self
    }

    pub fn exactly_one(mut self) -> Self {
        self.arity = Some(Arity::EXACTLY_ONE);
        self
    }

    pub fn zero_or_one(mut self) -> Self {
        self.arity = Some(Arity::ZERO_OR_ONE);
        self
    }

    pub fn zero_or_more(mut self) -> Self {
        self.arity = Some(Arity::ZERO_OR_MORE);
        self
    }

    pub fn one_or_more(mut self) -> Self {
        self.arity = Some(Arity::ONE_OR_MORE);
        self
    }

    /// Register a default value; evaluated lazily, only when no tokens were supplied.
    pub fn default_value(self, value: Value) -> Self {
        self.default_with(move || value.clone())
    }

    pub fn default_with<F>(mut self, supplier: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default_value = Some(Arc::new(supplier));
        self
    }

    /// Replace the type-driven conversion. The converter receives every
    /// collected token.
    pub fn converter<F>(mut self, convert: F) -> Self
    where
        F: Fn(&[&str]) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.converter = Some(Arc::new(convert));
        self
    }

    pub fn validator<V>(mut self, validator: V) -> Self
    where
        V: Validator + 'static,
    {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Restrict values to a finite set. The values double as suggestions.
    pub fn from_among<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn suggestions<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggestions.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn suggestion_source<S>(mut self, source: S) -> Self
    where
        S: SuggestionSource + 'static,
    {
        self.suggestion_sources.push(Arc::new(source));
        self
    }

    /// Every value must name an existing file or directory.
    pub fn existing_files_only(self) -> Self {
        self.validator(|result: ResultRef<'_>| {
            result
                .values()
                .into_iter()
                .find_map(|raw| match std::fs::metadata(raw) {
                    Ok(_) => None,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        Some(messages::file_does_not_exist(raw))
                    }
                    Err(e) => Some(e.to_string()),
                })
        })
    }

    /// Every value must name an existing directory.
    pub fn existing_directories_only(self) -> Self {
        self.validator(|result: ResultRef<'_>| {
            result
                .values()
                .into_iter()
                .find_map(|raw| match std::fs::metadata(raw) {
                    Ok(meta) if meta.is_dir() => None,
                    Ok(_) => Some(messages::directory_does_not_exist(raw)),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        Some(messages::directory_does_not_exist(raw))
                    }
                    Err(e) => Some(e.to_string()),
                })
        })
    }

    /// Every value must be a syntactically legal path.
    pub fn legal_file_paths_only(self) -> Self {
        self.validator(|result: ResultRef<'_>| {
            result.values().into_iter().find_map(|raw| {
                raw.chars()
                    .find(|c| is_illegal_path_char(*c))
                    .map(messages::invalid_character_in_path)
            })
        })
    }

    pub(crate) fn build(self, for_command: bool) -> Result<ArgumentSpec, BuildError> {
        let arity = match (self.arity, &self.value_type) {
            (Some(arity), _) => arity,
            (None, Some(ty)) => ty.default_arity(for_command),
            (None, None) if self.converter.is_some() => Arity::EXACTLY_ONE,
            (None, None) => Arity::ZERO,
        };
        if arity.min > arity.max {
            return Err(BuildError::InvalidArity {
                min: arity.min,
                max: arity.max,
            });
        }
        Ok(ArgumentSpec {
            name: self.name,
            description: self.description,
            value_type: self.value_type,
            arity,
            default_value: self.default_value,
            converter: self.converter,
            validators: self.validators,
            allowed_values: self.allowed_values,
            suggestions: self.suggestions,
            suggestion_sources: self.suggestion_sources,
        })
    }
}

fn is_illegal_path_char(c: char) -> bool {
    if c == '\0' {
        return true;
    }
    cfg!(windows) && (matches!(c, '<' | '>' | '"' | '|' | '?' | '*') || (c as u32) < 32)
}
