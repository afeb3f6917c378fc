//! Pattern compilers for the `like` family and `regexp` operators.
//!
//! LIKE syntax:
//! - `%` matches any run of characters (including none)
//! - `_` matches exactly one character
//! - `\` escapes the next character
//!
//! LIKE patterns are anchored at both ends.

use regex::{Regex, RegexBuilder};

use super::errors::{FilterError, FilterResult};

/// Compiles a SQL LIKE pattern into an anchored regular expression
pub fn like_to_regexp(pattern: &str, case_insensitive: bool) -> FilterResult<Regex> {
    let mut source = String::with_capacity(pattern.len() + 2);
    source.push('^');

    let mut escaping = false;
    for c in pattern.chars() {
        if escaping {
            source.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4])));
            escaping = false;
            continue;
        }
        match c {
            '\\' => escaping = true,
            '%' => source.push_str(".*"),
            '_' => source.push('.'),
            other => source.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
        }
    }
    // Dangling escape is a literal backslash
    if escaping {
        source.push_str("\\\\");
    }
    source.push('$');

    RegexBuilder::new(&source)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| {
            FilterError::invalid_argument(format!(
                "Unable to compile the LIKE pattern \"{}\": {}",
                pattern, e
            ))
        })
}

/// Compiles a regular expression with JavaScript-style flags.
///
/// `i`, `m` and `s` are honoured; `g`, `u` and `y` are accepted and ignored.
pub fn string_to_regexp(pattern: &str, flags: Option<&str>) -> FilterResult<Regex> {
    let mut builder = RegexBuilder::new(pattern);
    if let Some(flags) = flags {
        for flag in flags.chars() {
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                'g' | 'u' | 'y' => {}
                other => {
                    return Err(FilterError::invalid_argument(format!(
                        "The regular expression flag \"{}\" is not supported.",
                        other
                    )))
                }
            }
        }
    }

    builder.build().map_err(|e| FilterError::InvalidOperatorValue {
        operator: "regexp".to_string(),
        expected: "a valid regular expression".to_string(),
        value: format!("\"{}\" ({})", pattern, e),
    })
}
