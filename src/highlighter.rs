// ABOUTME: Syntax highlighter for the REPL
// Implements rustyline's Highlighter trait to color keywords, literals,
// and builtin names while preserving display width

use std::borrow::Cow;

use rustyline::highlight::{CmdKind, Highlighter};
use rustyline_derive::{Completer, Helper, Hinter, Validator};

use crate::builtins::{BUILTIN_CLASS_NAMES, BUILTIN_FUNCTION_NAMES};
use crate::token::{lookup_ident, TokenKind};

// 4-bit ANSI colors for maximum terminal compatibility
const COLOR_RESET: &str = "\x1b[0m";
const COLOR_KEYWORD: &str = "\x1b[1;35m"; // Bold magenta
const COLOR_BUILTIN: &str = "\x1b[36m"; // Cyan
const COLOR_NUMBER: &str = "\x1b[33m"; // Yellow
const COLOR_STRING: &str = "\x1b[32m"; // Green

/// REPL helper providing syntax-aware highlighting for loam source lines.
#[derive(Completer, Helper, Hinter, Validator)]
pub struct LoamHelper;

impl LoamHelper {
    pub fn new() -> Self {
        LoamHelper
    }
}

impl Default for LoamHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter for LoamHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let highlighted = highlight_line(line);
        if highlighted == line {
            Cow::Borrowed(line)
        } else {
            Cow::Owned(highlighted)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

fn is_builtin(word: &str) -> bool {
    BUILTIN_FUNCTION_NAMES.contains(&word) || BUILTIN_CLASS_NAMES.contains(&word)
}

fn highlight_line(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut result = String::with_capacity(line.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            // Strings: color the quotes and everything between them.
            '"' => {
                result.push_str(COLOR_STRING);
                result.push(chars[i]);
                i += 1;
                while i < chars.len() {
                    result.push(chars[i]);
                    if chars[i] == '"' {
                        i += 1;
                        break;
                    }
                    i += 1;
                }
                result.push_str(COLOR_RESET);
            }

            // Numbers, including floats.
            c if c.is_ascii_digit() => {
                result.push_str(COLOR_NUMBER);
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    result.push(chars[i]);
                    i += 1;
                }
                result.push_str(COLOR_RESET);
            }

            // Identifiers, keywords, and builtin names.
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                if lookup_ident(&word) != TokenKind::Ident {
                    result.push_str(COLOR_KEYWORD);
                    result.push_str(&word);
                    result.push_str(COLOR_RESET);
                } else if is_builtin(&word) {
                    result.push_str(COLOR_BUILTIN);
                    result.push_str(&word);
                    result.push_str(COLOR_RESET);
                } else {
                    result.push_str(&word);
                }
            }

            c => {
                result.push(c);
                i += 1;
            }
        }
    }

    result
}
