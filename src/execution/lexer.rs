//! Command line tokenizer.
//!
//! Splits on whitespace the way a non-POSIX shell lexer does: a quote that
//! opens a token groups everything up to the matching quote and both quote
//! characters stay in the token. Backslashes are literal, so Windows paths
//! survive untouched.

use crate::error::CommandError;
use crate::Result;

const QUOTES: [char; 2] = ['\'', '"'];

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

#[derive(Clone, Copy)]
enum State {
    /// Between tokens.
    Idle,
    /// Inside an unquoted word.
    Word,
    /// Inside a quoted token opened by the given quote.
    Quoted(char),
}

/// Split a command line into arguments.
///
/// Fails only when a quoted token is never closed.
pub fn split(line: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut token = String::new();
    let mut state = State::Idle;

    for c in line.chars() {
        match state {
            State::Idle => {
                if is_space(c) {
                    continue;
                }
                token.push(c);
                state = if QUOTES.contains(&c) {
                    State::Quoted(c)
                } else {
                    State::Word
                };
            }
            State::Word => {
                if is_space(c) {
                    tokens.push(std::mem::take(&mut token));
                    state = State::Idle;
                } else {
                    token.push(c);
                }
            }
            State::Quoted(quote) => {
                token.push(c);
                if c == quote {
                    // A closing quote ends the token even without whitespace.
                    tokens.push(std::mem::take(&mut token));
                    state = State::Idle;
                }
            }
        }
    }

    match state {
        State::Quoted(_) => Err(CommandError::Parse("No closing quotation".into())),
        State::Word => {
            tokens.push(token);
            Ok(tokens)
        }
        State::Idle => Ok(tokens),
    }
}
