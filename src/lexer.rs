//! Splitting of an input line into words.
//!
//! The rules are deliberately plain: spaces and tabs separate words, runs of
//! separators collapse, and nothing else is special. There is no quoting,
//! escaping or substitution.

/// Words of one input line, in order. Never empty.
///
/// The first word is the command name; the rest are its arguments. The list
/// owns copies of its words, so the line it was produced from can be dropped
/// or reused as soon as [`tokenize`] returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenList {
    tokens: Vec<String>,
}

impl TokenList {
    /// The command name (first word).
    pub fn command(&self) -> &str {
        &self.tokens[0]
    }

    /// Every word after the command name.
    pub fn args(&self) -> &[String] {
        &self.tokens[1..]
    }

    /// All words including the command name.
    pub fn as_slice(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Always `false`; present for symmetry with [`TokenList::len`].
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

fn is_separator(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}

/// Split `line` into words.
///
/// The caller strips the line terminator first. Returns `None` for a line
/// that holds nothing but separators, including the empty line.
///
/// ```
/// use minishell::lexer::tokenize;
/// let tokens = tokenize("  ls   -la  ").unwrap();
/// assert_eq!(tokens.as_slice(), ["ls", "-la"]);
/// assert!(tokenize(" \t ").is_none());
/// ```
pub fn tokenize(line: &str) -> Option<TokenList> {
    let tokens: Vec<String> = line
        .split(is_separator)
        .filter(|word| !word.is_empty())
        .map(str::to_owned)
        .collect();

    if tokens.is_empty() {
        None
    } else {
        Some(TokenList { tokens })
    }
}
