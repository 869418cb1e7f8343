//! A minimal SQL tokenizer used for comment-stripping and
//! statement-splitting, not for full SQL parsing.
//!
//! The lexer never fails: an unterminated string or block comment
//! yields the partial token it managed to consume rather than an
//! error, since both operations this module exposes only need to
//! recognize string/comment *boundaries*, not validate SQL.

use std::fmt;

/// A single lexical token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A single-, double-, or backtick-quoted string, including its
    /// delimiters, with backslash escapes consumed as part of the
    /// token.
    String(String),
    /// A `-- ...` line comment or `/* ... */` block comment,
    /// including its delimiters.
    Comment(String),
    /// A bare `;` outside any string or comment.
    Semicolon,
    /// A run of whitespace.
    Whitespace(String),
    /// A run of identifier characters (alphanumeric and `_`).
    Identifier(String),
    /// Any other single character (operators, punctuation).
    Operator(char),
    /// End of input.
    Eof
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) | Self::Comment(s) | Self::Whitespace(s) | Self::Identifier(s) => {
                f.write_str(s)
            }
            Self::Semicolon => f.write_str(";"),
            Self::Operator(c) => write!(f, "{c}"),
            Self::Eof => Ok(())
        }
    }
}

/// Tokenize `input` into a flat stream of [`Token`]s, terminated by a
/// single trailing [`Token::Eof`].
pub fn tokenize(input: &str) -> Vec<Token> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        match c {
            '\'' | '"' | '`' => {
                let (tok, next) = read_string(&chars, i, c);
                tokens.push(tok);
                i = next;
            }
            '-' if chars.get(i + 1) == Some(&'-') => {
                let (tok, next) = read_line_comment(&chars, i);
                tokens.push(tok);
                i = next;
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                let (tok, next) = read_block_comment(&chars, i);
                tokens.push(tok);
                i = next;
            }
            ';' => {
                tokens.push(Token::Semicolon);
                i += 1;
            }
            c if c.is_whitespace() => {
                let (tok, next) = read_run(&chars, i, char::is_whitespace, Token::Whitespace);
                tokens.push(tok);
                i = next;
            }
            c if is_identifier_char(c) => {
                let (tok, next) = read_run(&chars, i, is_identifier_char, Token::Identifier);
                tokens.push(tok);
                i = next;
            }
            c => {
                tokens.push(Token::Operator(c));
                i += 1;
            }
        }
    }

    tokens.push(Token::Eof);
    tokens
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn read_run(chars: &[char], start: usize, pred: impl Fn(char) -> bool, wrap: impl Fn(String) -> Token) -> (Token, usize) {
    let mut i = start;
    while i < chars.len() && pred(chars[i]) {
        i += 1;
    }
    (wrap(chars[start..i].iter().collect()), i)
}

/// Consume a quoted string starting at `start` (which must point at
/// the opening quote `delim`). Backslash escapes are consumed as part
/// of the string body. An unterminated string consumes to end of
/// input and is still returned as a [`Token::String`].
fn read_string(chars: &[char], start: usize, delim: char) -> (Token, usize) {
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' if i + 1 < chars.len() => {
                i += 2;
            }
            c if c == delim => {
                i += 1;
                break;
            }
            _ => {
                i += 1;
            }
        }
    }
    (Token::String(chars[start..i].iter().collect()), i)
}

/// Consume a `-- ...` comment up to but not including the terminating
/// newline (the newline itself becomes a separate whitespace token).
fn read_line_comment(chars: &[char], start: usize) -> (Token, usize) {
    let mut i = start;
    while i < chars.len() && chars[i] != '\n' {
        i += 1;
    }
    (Token::Comment(chars[start..i].iter().collect()), i)
}

/// Consume a `/* ... */` comment. An unterminated block comment
/// consumes to end of input and is still returned as a
/// [`Token::Comment`].
fn read_block_comment(chars: &[char], start: usize) -> (Token, usize) {
    let mut i = start + 2;
    while i < chars.len() {
        if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
            i += 2;
            break;
        }
        i += 1;
    }
    (Token::Comment(chars[start..i].iter().collect()), i)
}

/// Re-serialize `input` with every [`Token::Comment`] removed,
/// leaving everything else byte-exact.
pub fn strip_comments(input: &str) -> String {
    tokenize(input)
        .into_iter()
        .filter(|t| !matches!(t, Token::Comment(_)))
        .map(|t| t.to_string())
        .collect()
}

/// Split `input` on [`Token::Semicolon`] tokens that occur outside any
/// string or comment, discarding the semicolons themselves. Strings
/// and comments are opaque to the split: a `;` inside either is part
/// of the surrounding statement's text.
pub fn split_statements(input: &str) -> Vec<String> {
    let tokens = tokenize(input);
    let mut statements = Vec::new();
    let mut current = String::new();

    for token in tokens {
        match token {
            Token::Semicolon => {
                statements.push(std::mem::take(&mut current));
            }
            Token::Eof => {
                if !current.trim().is_empty() {
                    statements.push(current);
                }
                break;
            }
            other => current.push_str(&other.to_string())
        }
    }

    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_comments_removes_line_and_block_comments() {
        let input = "SELECT 1; -- trailing\n/* block */ SELECT 2;";
        let stripped = strip_comments(input);
        assert!(!stripped.contains("trailing"));
        assert!(!stripped.contains("block"));
        assert!(stripped.contains("SELECT 1"));
        assert!(stripped.contains("SELECT 2"));
    }

    #[test]
    fn strip_comments_preserves_semicolon_inside_string() {
        let input = "INSERT INTO t VALUES ('a;b');";
        let stripped = strip_comments(input);
        assert!(stripped.contains("'a;b'"));
    }

    #[test]
    fn strip_comments_is_idempotent() {
        let input = "SELECT 1; -- note\nSELECT 2;";
        let once = strip_comments(input);
        let twice = strip_comments(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn split_statements_splits_on_top_level_semicolons() {
        let stmts = split_statements("SELECT 1; SELECT 2;");
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].contains("SELECT 1"));
        assert!(stmts[1].contains("SELECT 2"));
    }

    #[test]
    fn split_statements_ignores_semicolon_inside_string() {
        let stmts = split_statements("INSERT INTO t VALUES ('a;b');");
        assert_eq!(stmts.len(), 1);
    }

    #[test]
    fn split_statements_ignores_semicolon_inside_comment() {
        let stmts = split_statements("SELECT 1; -- a;b\nSELECT 2;");
        assert_eq!(stmts.len(), 2);
    }

    #[test]
    fn unterminated_string_yields_partial_token_not_panic() {
        let tokens = tokenize("SELECT 'unterminated");
        assert!(tokens.iter().any(|t| matches!(t, Token::String(s) if s == "'unterminated")));
    }

    #[test]
    fn unterminated_block_comment_consumes_to_eof() {
        let tokens = tokenize("SELECT 1 /* oops");
        assert!(tokens.iter().any(|t| matches!(t, Token::Comment(s) if s == "/* oops")));
    }

    #[test]
    fn backslash_escape_does_not_terminate_string_early() {
        let tokens = tokenize(r"'a\'b'");
        assert_eq!(tokens[0], Token::String(r"'a\'b'".to_string()));
    }
}
