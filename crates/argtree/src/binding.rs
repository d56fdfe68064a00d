//! Name/type lookup of values in a [`ParseResult`].
//!
//! Callers describe the values they want with [`ValueDescriptor`]s; lookups
//! never fail, a missing value is simply `None`.

use indexmap::IndexMap;

use crate::argument::{Value, ValueType};
use crate::result::{ParseResult, ResultKind, ResultRef};
use crate::symbol::remove_prefix;

/// Where a descriptor may find its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueSource {
    #[default]
    Any,
    Option,
    Argument,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueDescriptor {
    pub name: String,
    pub value_type: Option<ValueType>,
    pub source: ValueSource,
}

impl ValueDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_type: None,
            source: ValueSource::Any,
        }
    }

    pub fn of_type(mut self, ty: ValueType) -> Self {
        self.value_type = Some(ty);
        self
    }

    pub fn from_option(mut self) -> Self {
        self.source = ValueSource::Option;
        self
    }

    pub fn from_argument(mut self) -> Self {
        self.source = ValueSource::Argument;
        self
    }
}

impl ParseResult {
    /// Look up a value by descriptor, innermost command first.
    pub fn try_get_value(&self, descriptor: &ValueDescriptor) -> Option<Value> {
        let wanted = normalize(&descriptor.name);
        let found = self.lookup(&wanted, descriptor.source)?;
        let value = found.value()?;
        coerce(value, &found.values(), descriptor.value_type.as_ref())
    }

    /// Untyped lookup by name or alias.
    pub fn get_value(&self, name: &str) -> Option<Value> {
        self.try_get_value(&ValueDescriptor::new(name))
    }

    /// Resolve every descriptor that has a value, keyed by descriptor name.
    pub fn bind(&self, descriptors: &[ValueDescriptor]) -> IndexMap<String, Value> {
        descriptors
            .iter()
            .filter_map(|d| Some((d.name.clone(), self.try_get_value(d)?)))
            .collect()
    }

    fn lookup(&self, wanted: &str, source: ValueSource) -> Option<ResultRef<'_>> {
        let mut current = Some(self.command());
        while let Some(command) = current {
            if source != ValueSource::Argument {
                let option = command
                    .children()
                    .filter(|c| c.kind() == ResultKind::Option)
                    .find(|c| names_match(c, wanted));
                if option.is_some() {
                    return option;
                }
            }
            if source != ValueSource::Option
                && command.symbol().argument().arity().takes_values()
                && command
                    .symbol()
                    .argument()
                    .name()
                    .is_some_and(|name| normalize(name) == wanted)
            {
                return Some(command);
            }
            current = command.parent();
        }
        None
    }
}

fn names_match(result: &ResultRef<'_>, wanted: &str) -> bool {
    let symbol = result.symbol();
    normalize(symbol.name()) == wanted || symbol.aliases().iter().any(|a| normalize(a) == wanted)
}

/// `--string-option`, `string_option` and `StringOption` all normalize to
/// `stringoption`.
fn normalize(name: &str) -> String {
    remove_prefix(name.trim())
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn coerce(value: &Value, raw: &[&str], ty: Option<&ValueType>) -> Option<Value> {
    let Some(ty) = ty else {
        return Some(value.clone());
    };
    if value.conforms_to(ty) {
        return Some(value.clone());
    }
    match (value, ty) {
        (Value::Unit, ValueType::Bool) => Some(Value::Bool(true)),
        (Value::Unit, _) => None,
        (_, ValueType::List(inner)) if !raw.is_empty() => raw
            .iter()
            .map(|r| inner.convert(r))
            .collect::<Result<Vec<_>, _>>()
            .ok()
            .map(Value::List),
        _ => {
            let text = match raw.first() {
                Some(raw) => raw.to_string(),
                None => value.to_string(),
            };
            ty.convert(&text).ok()
        }
    }
}
