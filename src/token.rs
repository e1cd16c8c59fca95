//! Word/whitespace tokenizer and line splitter.
//!
//! This is the lowest layer of the merge core: every other component
//! (LCS, char diff, hunks, three-way merge, zone detection) consumes the
//! token or line arrays produced here.

use serde::{Deserialize, Serialize};

/// A single token: a maximal run of whitespace or a maximal run of
/// non-whitespace characters.
///
/// Tokens partition the source string exactly — concatenating `text` over
/// every token returned by [`tokenize`] reconstructs the input byte for
/// byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub is_whitespace: bool,
}

/// A character is whitespace for tokenization purposes iff its code point
/// is one of space, tab, LF, CR, or FF.
fn is_token_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{000C}')
}

/// Split `text` into maximal whitespace/non-whitespace runs.
///
/// An empty input yields an empty sequence. Round-trip law: concatenating
/// `token.text` over the result reproduces `text` exactly.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    if text.is_empty() {
        return tokens;
    }

    let mut current = String::new();
    let mut current_is_ws: Option<bool> = None;

    for c in text.chars() {
        let ws = is_token_whitespace(c);
        match current_is_ws {
            Some(prev_ws) if prev_ws == ws => {
                current.push(c);
            }
            Some(prev_ws) => {
                tokens.push(Token {
                    text: std::mem::take(&mut current),
                    is_whitespace: prev_ws,
                });
                current.push(c);
                current_is_ws = Some(ws);
            }
            None => {
                current.push(c);
                current_is_ws = Some(ws);
            }
        }
    }

    if let Some(ws) = current_is_ws {
        tokens.push(Token {
            text: current,
            is_whitespace: ws,
        });
    }

    tokens
}

/// Split `text` on `'\n'`, never collapsing empty lines. A trailing
/// newline yields a trailing empty line, matching `str::split('\n')`
/// semantics exactly.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split('\n').map(|s| s.to_string()).collect()
}
