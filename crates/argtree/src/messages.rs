//! User-facing diagnostic texts.

use crate::symbol::Symbol;

pub fn required_argument_missing(symbol: &Symbol) -> String {
    if symbol.is_command() {
        format!("Required argument missing for command: {}", symbol.name())
    } else {
        format!(
            "Required argument missing for option: {}",
            symbol.display_alias()
        )
    }
}

pub fn expects_one_argument(symbol: &Symbol, found: usize) -> String {
    if symbol.is_command() {
        format!(
            "Command '{}' expects a single argument but {found} were provided.",
            symbol.name()
        )
    } else {
        format!(
            "Option '{}' expects a single argument but {found} were provided.",
            symbol.display_alias()
        )
    }
}

pub fn expects_fewer_arguments(symbol: &Symbol, max: usize, found: usize) -> String {
    if symbol.is_command() {
        format!(
            "Command '{}' expects no more than {max} arguments, but {found} were provided.",
            symbol.name()
        )
    } else {
        format!(
            "Option '{}' expects no more than {max} arguments, but {found} were provided.",
            symbol.display_alias()
        )
    }
}

pub fn unrecognized_command_or_argument(raw: &str) -> String {
    format!("Unrecognized command or argument '{raw}'")
}

pub fn required_command_not_provided() -> String {
    "Required command was not provided.".to_string()
}

pub fn cannot_parse(raw: &str, type_name: &str) -> String {
    format!("Cannot parse argument '{raw}' as expected type {type_name}.")
}

pub fn file_does_not_exist(path: &str) -> String {
    format!("File does not exist: {path}")
}

pub fn directory_does_not_exist(path: &str) -> String {
    format!("Directory does not exist: {path}")
}

pub fn invalid_character_in_path(c: char) -> String {
    format!("Character not allowed in a path: {}", c.escape_default())
}

pub fn invalid_directive(raw: &str) -> String {
    format!("Invalid directive syntax '{raw}'")
}
