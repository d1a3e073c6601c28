// ABOUTME: Configuration and constants for the loam interpreter
// This module contains version info, the REPL banner, and exit codes

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const WELCOME_MESSAGE: &str = "Loam Interpreter";
pub const WELCOME_SUBTITLE: &str = "A class-based, dynamically-typed scripting language";

/// The REPL prompt.
pub const PROMPT: &str = ">> ";

/// File used to persist REPL history between sessions.
pub const HISTORY_FILE: &str = ".loam_history";

/// Exit code used when the parser reports errors. Kept distinct from the
/// generic failure code so scripted callers can tell the two apart.
pub const EXIT_PARSE_ERROR: i32 = 69;

/// Exit code for resolution failures detected before evaluation begins.
pub const EXIT_RESOLVE_ERROR: i32 = 1;
