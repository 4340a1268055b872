//! Turns one raw source line into a statement shape.
//!
//! Every line is trimmed before it is looked at. The shapes are probed in a
//! fixed order: empty/comment, directive, function header, closing brace,
//! call, print. Whatever matches none of them comes back as [`Line::Unknown`]
//! so the caller can report it.

use regex::Regex;
use std::num::IntErrorKind;
use std::sync::LazyLock;

/// Marks a line as a comment when it starts the trimmed line.
pub const COMMENT_MARKER: char = '#';

/// Keyword that introduces a directive line. The trailing space is part of it.
pub const DIRECTIVE_KEYWORD: &str = "msx ";

/// Line that closes a function body.
pub const BODY_CLOSE: &str = "}";

static FUNCTION_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^function\s+(\w+)\((.*?)\)\s*\{$").expect("valid regex"));
static CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^call\s+(\w+)\((.*)\)$").expect("valid regex"));
static PRINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^print\s+"(.*)"$"#).expect("valid regex"));

/// Shape of a single classified source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Blank line or comment.
    Empty,
    /// `function name(a, b) {`
    FunctionOpen { name: String, params: Vec<String> },
    /// `}`
    FunctionClose,
    /// `call name("x", "y")`
    Call { name: String, args: Vec<String> },
    /// `print "text"`, the text between the outer quotes taken verbatim.
    Print { text: String },
    /// `msx <text>`, `text` is everything after the keyword.
    Directive { text: String },
    /// Anything else, trimmed.
    Unknown { text: String },
}

/// Classify one line of source.
pub fn classify(raw: &str) -> Line {
    let line = raw.trim();

    if line.is_empty() || line.starts_with(COMMENT_MARKER) {
        return Line::Empty;
    }

    if let Some(rest) = line.strip_prefix(DIRECTIVE_KEYWORD) {
        return Line::Directive {
            text: rest.trim_start().to_string(),
        };
    }

    if let Some(caps) = FUNCTION_OPEN.captures(line) {
        return Line::FunctionOpen {
            name: caps[1].to_string(),
            params: split_list(&caps[2], false),
        };
    }

    if line == BODY_CLOSE {
        return Line::FunctionClose;
    }

    if let Some(caps) = CALL.captures(line) {
        return Line::Call {
            name: caps[1].to_string(),
            args: split_list(&caps[2], true),
        };
    }

    if let Some(caps) = PRINT.captures(line) {
        return Line::Print {
            text: caps[1].to_string(),
        };
    }

    Line::Unknown {
        text: line.to_string(),
    }
}

/// Split a comma separated list, trimming every entry and dropping the ones
/// left empty. With `unquote` set, surrounding `"` characters are stripped
/// from what remains.
fn split_list(list: &str, unquote: bool) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            if unquote {
                entry.trim_matches('"').to_string()
            } else {
                entry.to_string()
            }
        })
        .collect()
}

/// Parse a whole number written in a directive or an answer.
///
/// Numbers beyond the `i64` range saturate instead of failing; only text that
/// is not a number at all gives `None`.
pub fn parse_integer(text: &str) -> Option<i64> {
    match text.parse::<i64>() {
        Ok(n) => Some(n),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Some(i64::MAX),
            IntErrorKind::NegOverflow => Some(i64::MIN),
            _ => None,
        },
    }
}
