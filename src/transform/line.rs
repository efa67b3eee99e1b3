use std::sync::LazyLock;

use regex::Regex;

use super::dictionary::Dictionary;
use crate::config::constants::FIELD_SEPARATOR;

// Fields are separated by two or more whitespace characters or by any run of tabs
static FIELD_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}|\t+").unwrap());

/// Substitute a single body line.
///
/// Returns `None` when the line must be emitted unchanged: blank lines, lines without a
/// field separator, unknown identifiers and lines already in their rebuilt form.
/// A substituted line is `identifier + FIELD_SEPARATOR + replacement`, followed by the
/// fields after the second one joined with single spaces.
pub fn substitute_line(line: &str, dictionary: &Dictionary) -> Option<String> {
    if line.trim().is_empty() {
        return None;
    }

    let fields: Vec<&str> = FIELD_SPLIT.split(line).collect();
    let [identifier, _text, extra @ ..] = fields.as_slice() else {
        return None;
    };

    let identifier = identifier.trim();
    if identifier.is_empty() {
        return None;
    }

    let replacement = dictionary.get(identifier)?;
    if is_rebuilt_form(line, identifier, replacement) {
        return None;
    }

    let mut translated = String::with_capacity(line.len() + replacement.len());
    translated.push_str(identifier);
    translated.push_str(FIELD_SEPARATOR);
    translated.push_str(replacement);

    if !extra.is_empty() {
        translated.push(' ');
        translated.push_str(&extra.join(" "));
    }

    Some(translated)
}

// `identifier + FIELD_SEPARATOR + replacement`, optionally followed by single-space joined
// trailing fields. Re-splitting such a line would merge the trailing fields into the text
// field, or cut a replacement that itself contains a field separator.
fn is_rebuilt_form(line: &str, identifier: &str, replacement: &str) -> bool {
    let Some(rest) = line
        .strip_prefix(identifier)
        .and_then(|rest| rest.strip_prefix(FIELD_SEPARATOR))
        .and_then(|rest| rest.strip_prefix(replacement))
    else {
        return false;
    };

    rest.is_empty() || (rest.starts_with(' ') && !FIELD_SPLIT.is_match(rest))
}
