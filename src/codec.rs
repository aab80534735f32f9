//! Line codec
//!
//! Splits a raw protocol line into colon-delimited fields and classifies
//! its well-formedness. There is no escaping: a `:` inside a message
//! always acts as a separator.

/// Field separator
pub const SEPARATOR: char = ':';

/// A raw line split into fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLine {
    /// Command name followed by its arguments
    pub fields: Vec<String>,
    /// Set for an empty line or a bare word without the trailing `:`
    pub malformed: bool,
}

impl DecodedLine {
    /// Command name (first field), if any
    pub fn name(&self) -> Option<&str> {
        self.fields.first().map(String::as_str)
    }

    /// Argument at `index` (0 = first field after the name)
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.fields.get(index + 1).map(String::as_str)
    }

    /// Number of fields including the command name
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Decode one line (terminator already stripped)
///
/// A single trailing `:` terminates the command and is not a field
/// separator, so `DONE:` decodes to `["DONE"]` while `DONE` is malformed.
/// Empty fields between separators are kept.
pub fn decode(raw: &str) -> DecodedLine {
    if raw.is_empty() {
        return DecodedLine {
            fields: Vec::new(),
            malformed: true,
        };
    }

    let terminated = raw.ends_with(SEPARATOR);
    let body = raw.strip_suffix(SEPARATOR).unwrap_or(raw);
    let fields: Vec<String> = body.split(SEPARATOR).map(str::to_string).collect();
    let malformed = fields.len() == 1 && !terminated;

    DecodedLine { fields, malformed }
}

/// Join fields into a wire line (without the newline)
///
/// Single-field commands get the trailing separator, e.g. `["YT"]` -> `YT:`.
pub fn encode<S: AsRef<str>>(fields: &[S]) -> String {
    let mut line = fields
        .iter()
        .map(AsRef::<str>::as_ref)
        .collect::<Vec<_>>()
        .join(":");
    if fields.len() == 1 {
        line.push(SEPARATOR);
    }
    line
}

/// Whether a config/response file line is a comment
///
/// True when the first non-whitespace character is `#`.
pub fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('#')
}
