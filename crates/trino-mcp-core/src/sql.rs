//! SQL text helpers.
//!
//! Every value interpolated into compiled SQL goes through one of these
//! functions. The engine protocol has no bind parameters, so quoting is the
//! only line of defense; tool callers are operator-configured agents.

use regex::Regex;
use std::sync::LazyLock;

static LIMIT_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blimit\b").expect("valid LIMIT regex"));

static LIMIT_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blimit\s+(\d+)").expect("valid LIMIT value regex"));

/// Render a double-quoted identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Render a single-quoted string literal, doubling embedded quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Render a projection list. `None`, an empty list, or a lone `*` select everything.
pub fn column_list(columns: Option<&[String]>) -> String {
    match columns {
        Some(cols) if !cols.is_empty() && !(cols.len() == 1 && cols[0] == "*") => cols
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", "),
        _ => "*".to_string(),
    }
}

/// Whether the statement already contains a `LIMIT` keyword (any case).
///
/// String literals, quoted identifiers and comments are not searched.
pub fn has_limit_clause(sql: &str) -> bool {
    LIMIT_WORD.is_match(&code_only(sql))
}

/// The row count of the last `LIMIT <n>` in the statement, if any.
pub fn existing_limit(sql: &str) -> Option<u64> {
    LIMIT_VALUE
        .captures_iter(&code_only(sql))
        .last()
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Blank out `'...'` and `"..."` spans plus `--` and `/* */` comments.
///
/// Skipped spans become whitespace so neighbouring words stay apart.
/// A doubled quote inside a quoted span is an escaped quote.
fn code_only(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                while let Some(inner) = chars.next() {
                    if inner == c {
                        if chars.peek() == Some(&c) {
                            chars.next();
                        } else {
                            break;
                        }
                    }
                }
                out.push(' ');
            }
            '-' if chars.peek() == Some(&'-') => {
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        break;
                    }
                }
                out.push('\n');
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for inner in chars.by_ref() {
                    if prev == '*' && inner == '/' {
                        break;
                    }
                    prev = inner;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

/// Strip surrounding whitespace and trailing statement terminators.
pub fn trim_statement(sql: &str) -> &str {
    sql.trim().trim_end_matches(|c: char| c == ';' || c.is_whitespace())
}
