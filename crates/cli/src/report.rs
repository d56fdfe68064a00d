use argtree::{ParseError, ParseErrorKind, ParseResult, ResultKind, SymbolTree};
use argtree_schema::value_to_json;
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ParseReport {
    pub input: String,
    pub command: String,
    pub diagram: String,
    pub values: IndexMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub directives: IndexMap<String, Vec<String>>,
    pub unmatched: Vec<String>,
    pub errors: Vec<ErrorReport>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ErrorReport {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl ParseReport {
    pub fn new(result: &ParseResult) -> Self {
        let mut values = IndexMap::new();
        for r in result.results() {
            let takes_values = r.symbol().argument().arity().takes_values();
            if r.kind() == ResultKind::Command && !takes_values {
                continue;
            }
            let Some(value) = r.value() else { continue };
            let json = value_to_json(value).unwrap_or(serde_json::Value::Bool(true));
            let key = match (r.kind(), r.symbol().argument().name()) {
                (ResultKind::Command, Some(name)) => name.to_string(),
                _ => r.name().to_string(),
            };
            values.insert(key, json);
        }

        Self {
            input: result.raw_input(),
            command: result.command().name().to_string(),
            diagram: result.diagram(),
            values,
            directives: result.directives().clone(),
            unmatched: result
                .unmatched_tokens()
                .iter()
                .map(|t| t.value().to_string())
                .collect(),
            errors: result.errors().iter().map(ErrorReport::new).collect(),
        }
    }
}

impl ErrorReport {
    fn new(error: &ParseError) -> Self {
        Self {
            kind: kind_name(error.kind()),
            message: error.message().to_string(),
            token: error.token().map(|t| t.value().to_string()),
        }
    }
}

fn kind_name(kind: &ParseErrorKind) -> &'static str {
    match kind {
        ParseErrorKind::TokenizeError => "tokenize-error",
        ParseErrorKind::UnrecognizedToken => "unrecognized-token",
        ParseErrorKind::MissingRequiredValue => "missing-required-value",
        ParseErrorKind::TooManyValues => "too-many-values",
        ParseErrorKind::TypeConversionFailed => "type-conversion-failed",
        ParseErrorKind::DisallowedValue { .. } => "disallowed-value",
        ParseErrorKind::CustomValidationFailed => "custom-validation-failed",
        ParseErrorKind::RequiredSubcommandMissing => "required-subcommand-missing",
    }
}

/// Indented outline of a grammar, one symbol per line.
pub fn outline(tree: &SymbolTree) -> String {
    let mut out = String::new();
    outline_symbol(tree, tree.root().id(), 0, &mut out);
    out
}

fn outline_symbol(tree: &SymbolTree, id: argtree::SymbolId, depth: usize, out: &mut String) {
    let symbol = tree.get(id);
    let arity = symbol.argument().arity();
    out.push_str(&"  ".repeat(depth));
    out.push_str(&symbol.aliases().join(", "));
    if arity.takes_values() {
        let ty = symbol
            .argument()
            .value_type()
            .map(|t| t.name())
            .unwrap_or_else(|| "custom".to_string());
        out.push_str(&format!(" <{ty}> [{arity}]"));
    }
    if symbol.is_hidden() {
        out.push_str(" (hidden)");
    }
    if !symbol.description().is_empty() {
        out.push_str(&format!("  {}", symbol.description()));
    }
    out.push('\n');
    for child in symbol.children() {
        outline_symbol(tree, *child, depth + 1, out);
    }
}
