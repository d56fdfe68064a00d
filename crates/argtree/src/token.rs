//! Tokens and command-line string helpers.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Command,
    Option,
    Argument,
    Directive,
    EndOfOptions,
    Unparsed,
}

/// One classified piece of input. Tokens are produced fresh per parse and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    value: String,
    token_type: TokenType,
    position: Option<usize>,
}

impl Token {
    pub fn new(value: impl Into<String>, token_type: TokenType, position: usize) -> Self {
        Self {
            value: value.into(),
            token_type,
            position: Some(position),
        }
    }

    /// A token synthesized by the parser (implicit root, injected defaults).
    pub fn implicit(value: impl Into<String>, token_type: TokenType) -> Self {
        Self {
            value: value.into(),
            token_type,
            position: None,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    /// Index of the raw argument this token came from. Split tokens
    /// (`--name=value`, `-abc`) share their source's position.
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn is_implicit(&self) -> bool {
        self.position.is_none()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Split a single command-line string into arguments.
///
/// Whitespace separates arguments outside double quotes. Inside quotes `\"`
/// and `\\` are escapes; outside quotes only `\"` is.
pub fn split_command_line(input: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut started = false;
    let mut quoted = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'"') || (quoted && chars.peek() == Some(&'\\')) => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                started = true;
            }
            '"' => {
                quoted = !quoted;
                started = true;
            }
            c if c.is_whitespace() && !quoted => {
                if started {
                    out.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }
    if started {
        out.push(current);
    }
    out
}

/// Inverse of [`split_command_line`]: quote arguments that need it.
pub fn render_command_line<S: AsRef<str>>(args: &[S]) -> String {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let arg = arg.as_ref();
        let needs_quotes =
            arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || c == '"' || c == '\\');
        if !needs_quotes {
            out.push_str(arg);
            continue;
        }
        out.push('"');
        for c in arg.chars() {
            if c == '"' || c == '\\' {
                out.push('\\');
            }
            out.push(c);
        }
        out.push('"');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace_and_honours_quotes() {
        assert_eq!(
            split_command_line(r#"move "my file.txt"  --to  dir"#),
            vec!["move", "my file.txt", "--to", "dir"]
        );
        assert_eq!(split_command_line(r#"a "" b"#), vec!["a", "", "b"]);
        assert_eq!(split_command_line(r#"say \"hi\""#), vec!["say", "\"hi\""]);
        assert!(split_command_line("   ").is_empty());
    }

    #[test]
    fn rendering_round_trips_through_splitting() {
        let args = vec![
            "plain".to_string(),
            "with space".to_string(),
            String::new(),
            r#"quote"inside"#.to_string(),
            r"C:\temp\".to_string(),
            r"a b\".to_string(),
            "tab\there".to_string(),
        ];
        let rendered = render_command_line(&args);
        assert_eq!(split_command_line(&rendered), args);
    }

    #[test]
    fn implicit_tokens_have_no_position() {
        let token = Token::implicit("--verbose", TokenType::Option);
        assert!(token.is_implicit());
        assert_eq!(Token::new("x", TokenType::Argument, 3).position(), Some(3));
    }
}
