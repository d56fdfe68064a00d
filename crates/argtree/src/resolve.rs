//! Arity checks, allowed values, conversion, defaults and custom validation.
//!
//! Checks run in a fixed order and stop at the first failure, so a result
//! carries at most one error. Arity comes before the allowed-value set.

use crate::argument::Value;
use crate::messages;
use crate::result::{ArgumentResult, ParseErrorKind, ResultRef};
use crate::symbol::Symbol;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Failure {
    pub(crate) kind: ParseErrorKind,
    pub(crate) message: String,
    pub(crate) outcome: ArgumentResult,
    pub(crate) can_retry_token: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Resolution {
    Resolved { value: Value, from_default: bool },
    Failed(Failure),
}

/// Resolve a matched result into its final outcome.
pub(crate) fn resolve(result: ResultRef<'_>) -> Resolution {
    let symbol = result.symbol();
    let spec = symbol.argument();

    if result.is_implicit() {
        return Resolution::Resolved {
            value: spec.default_value().unwrap_or(Value::Unit),
            from_default: true,
        };
    }

    let values = result.values();
    let arity = spec.arity();
    if symbol.is_option() && values.is_empty() && spec.is_flag_like() {
        return Resolution::Resolved {
            value: Value::Bool(true),
            from_default: false,
        };
    }

    if values.len() < arity.min {
        if values.is_empty()
            && symbol.is_command()
            && let Some(value) = spec.default_value()
        {
            return Resolution::Resolved {
                value,
                from_default: true,
            };
        }
        return Resolution::Failed(Failure {
            kind: ParseErrorKind::MissingRequiredValue,
            message: messages::required_argument_missing(symbol),
            outcome: ArgumentResult::MissingRequiredValue,
            can_retry_token: false,
        });
    }

    if values.len() > arity.max {
        return Resolution::Failed(too_many(symbol, values.len()));
    }

    if let Some(failure) = disallowed(symbol, &values) {
        return Resolution::Failed(failure);
    }

    if values.is_empty()
        && let Some(value) = spec.default_value()
    {
        return Resolution::Resolved {
            value,
            from_default: true,
        };
    }

    let value = match spec.convert(&values) {
        Ok(value) => value,
        Err(message) => return Resolution::Failed(conversion_failed(symbol, message)),
    };

    let view = result.with_pending(&value);
    for validator in spec.validators() {
        if let Some(message) = validator.validate(view)
            && !message.trim().is_empty()
        {
            return Resolution::Failed(Failure {
                kind: ParseErrorKind::CustomValidationFailed,
                message,
                outcome: ArgumentResult::Unparsed,
                can_retry_token: false,
            });
        }
    }

    Resolution::Resolved {
        value,
        from_default: false,
    }
}

/// Checks applied while an option is still collecting tokens: would taking
/// `values` be rejected outright? Lower arity bounds and validators are left
/// to final resolution.
pub(crate) fn trial(symbol: &Symbol, values: &[&str]) -> Option<Failure> {
    let spec = symbol.argument();
    if values.len() > spec.arity().max {
        return Some(too_many(symbol, values.len()));
    }
    if let Some(failure) = disallowed(symbol, values) {
        return Some(failure);
    }
    spec.convert(values)
        .err()
        .map(|message| conversion_failed(symbol, message))
}

fn disallowed(symbol: &Symbol, values: &[&str]) -> Option<Failure> {
    let spec = symbol.argument();
    let value = values.iter().find(|raw| !spec.allows(raw))?;
    Some(Failure {
        kind: ParseErrorKind::DisallowedValue {
            value: value.to_string(),
            allowed: spec.allowed_values().map(str::to_string).collect(),
        },
        message: messages::required_argument_missing(symbol),
        outcome: ArgumentResult::Unparsed,
        can_retry_token: false,
    })
}

fn too_many(symbol: &Symbol, found: usize) -> Failure {
    let max = symbol.argument().arity().max;
    let message = if max == 1 {
        messages::expects_one_argument(symbol, found)
    } else {
        messages::expects_fewer_arguments(symbol, max, found)
    };
    Failure {
        kind: ParseErrorKind::TooManyValues,
        message,
        outcome: ArgumentResult::TooManyValues,
        can_retry_token: false,
    }
}

fn conversion_failed(symbol: &Symbol, message: String) -> Failure {
    Failure {
        kind: ParseErrorKind::TypeConversionFailed,
        message: message.clone(),
        outcome: ArgumentResult::TypeConversionFailed(message),
        can_retry_token: symbol.is_option() && symbol.argument().arity().min == 0,
    }
}
