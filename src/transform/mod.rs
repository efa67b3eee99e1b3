//! Record parsing and substitution.
//!
//! A record is a `\r\n`-separated blob: four opaque header lines followed by body lines of
//! the form `identifier  text  extra...`. Body lines whose identifier is found in the
//! [`Dictionary`] are rebuilt with the replacement text; everything else is emitted as is.

pub mod dictionary;
pub mod gate;
pub mod line;
pub mod patterns;

pub use dictionary::Dictionary;
pub use gate::TextGate;
pub use line::substitute_line;
pub use patterns::{PatternHandler, TextPatterns};

use crate::config::constants::{HEADER_LINES, LINE_SEPARATOR};

/// Why an input was returned without being parsed as a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassthroughReason {
    TooFewLines,
    TooShort,
    TooLong,
    MissingPrefix,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformKind {
    Passthrough(PassthroughReason),
    Record { substitutions: usize },
    Pattern { pattern: String },
}

/// Result of a single transform. `text` may equal the input even for
/// [`TransformKind::Record`] when no identifier matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    pub text: String,
    pub kind: TransformKind,
}

impl TransformOutput {
    pub fn passthrough(raw: &str, reason: PassthroughReason) -> Self {
        Self {
            text: raw.to_string(),
            kind: TransformKind::Passthrough(reason),
        }
    }

    pub fn substitutions(&self) -> usize {
        match self.kind {
            TransformKind::Record { substitutions } => substitutions,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordTransformer {
    dictionary: Dictionary,
}

impl RecordTransformer {
    pub fn new(dictionary: Dictionary) -> Self {
        Self { dictionary }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn transform(&self, raw: &str) -> TransformOutput {
        let lines: Vec<&str> = raw.split(LINE_SEPARATOR).collect();
        if lines.len() <= HEADER_LINES {
            tracing::trace!(lines = lines.len(), "Not a record, too few lines");
            return TransformOutput::passthrough(raw, PassthroughReason::TooFewLines);
        }

        let (header, body) = lines.split_at(HEADER_LINES);
        let mut substitutions = 0;

        let body: Vec<String> = body
            .iter()
            .map(|line| match substitute_line(line, &self.dictionary) {
                Some(translated) => {
                    substitutions += 1;
                    translated
                }
                None => line.to_string(),
            })
            .collect();

        let mut text = header.join(LINE_SEPARATOR);
        text.push_str(LINE_SEPARATOR);
        text.push_str(&body.join(LINE_SEPARATOR));

        if substitutions > 0 {
            tracing::trace!(
                "Applied {} substitutions across {} body lines",
                substitutions,
                body.len()
            );
        }

        TransformOutput {
            text,
            kind: TransformKind::Record { substitutions },
        }
    }
}
