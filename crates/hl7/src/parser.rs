//! Segment parser.
//!
//! Splits raw message text into segments, fields, and components using the
//! delimiters the message itself declares in MSH-1/MSH-2, falling back to
//! the standard HL7 set (`|^~\&`) when the declaration is absent or
//! malformed. An explicit caller override wins over both.
//!
//! Field and component indices are 1-based per HL7 convention and stable
//! across repeated lookups: a field that is empty on the wire is an
//! explicit empty value, never a shifted index.

use crate::ParseError;

/// Delimiter set for one message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Delimiters {
    /// Field separator (MSH-1, typically `|`).
    pub field: char,
    /// Component separator (first encoding character, typically `^`).
    pub component: char,
    /// Repetition separator (typically `~`).
    pub repetition: char,
    /// Escape character (typically `\`).
    pub escape: char,
    /// Subcomponent separator (typically `&`).
    pub subcomponent: char,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            field: '|',
            component: '^',
            repetition: '~',
            escape: '\\',
            subcomponent: '&',
        }
    }
}

impl Delimiters {
    /// Read the delimiter declaration from a raw MSH line.
    ///
    /// MSH-1 is the character immediately after `MSH`; MSH-2 holds up to
    /// four encoding characters. Missing positions keep their defaults.
    fn from_header_line(line: &str) -> Self {
        let mut delims = Delimiters::default();
        let mut chars = line.chars().skip(3);

        let Some(field) = chars.next() else {
            return delims;
        };
        delims.field = field;

        // MSH-2 runs from after the field separator up to the next one.
        let encoding: Vec<char> = chars.take_while(|&c| c != field).collect();
        if let Some(&c) = encoding.first() {
            delims.component = c;
        }
        if let Some(&c) = encoding.get(1) {
            delims.repetition = c;
        }
        if let Some(&c) = encoding.get(2) {
            delims.escape = c;
        }
        if let Some(&c) = encoding.get(3) {
            delims.subcomponent = c;
        }
        delims
    }
}

/// One parsed segment: a type code plus an ordered field list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    code: String,
    fields: Vec<String>,
    component_sep: char,
}

impl Segment {
    fn new(code: String, fields: Vec<String>, component_sep: char) -> Self {
        Self {
            code,
            fields,
            component_sep,
        }
    }

    /// Segment type code (e.g. `MSH`, `PID`, `PV1`).
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Raw field by 1-based HL7 index.
    ///
    /// Returns `None` past the populated range and `Some("")` for a field
    /// that is present but empty on the wire. For MSH the index space is
    /// offset so that `field(9)` is MSH-9: the field separator itself
    /// counts as MSH-1.
    pub fn field(&self, index: u16) -> Option<&str> {
        if index == 0 {
            return None;
        }
        self.fields.get(usize::from(index) - 1).map(String::as_str)
    }

    /// Trimmed non-empty field value, treating empty and absent alike.
    pub fn value(&self, index: u16) -> Option<&str> {
        self.field(index)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Component of a field by 1-based indices. A field without the
    /// component separator is its own first component.
    pub fn component(&self, field: u16, component: u16) -> Option<&str> {
        if component == 0 {
            return None;
        }
        let raw = self.field(field)?;
        raw.split(self.component_sep)
            .nth(usize::from(component) - 1)
    }

    /// Trimmed non-empty component value.
    pub fn component_value(&self, field: u16, component: u16) -> Option<&str> {
        self.component(field, component)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Number of populated fields (highest populated HL7 index).
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// Ordered sequence of segments for one message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedMessage {
    segments: Vec<Segment>,
    delimiters: Delimiters,
}

impl ParsedMessage {
    /// Parse raw message text using declared-or-default delimiters.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Empty`] when normalization leaves zero
    /// segments and [`ParseError::MissingHeader`] when no MSH segment can
    /// be located.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        Self::parse_with(raw, None)
    }

    /// Parse with an explicit delimiter override.
    pub fn parse_with(raw: &str, overrides: Option<Delimiters>) -> Result<Self, ParseError> {
        // Normalize line breaks; segments arrive CR-, LF-, or CRLF-separated.
        let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");
        let lines: Vec<&str> = normalized
            .split('\n')
            .map(str::trim_end)
            .filter(|l| !l.trim().is_empty())
            .collect();

        if lines.is_empty() {
            return Err(ParseError::Empty);
        }

        let header_line = lines
            .iter()
            .find(|l| l.starts_with("MSH"))
            .ok_or(ParseError::MissingHeader)?;

        let delimiters =
            overrides.unwrap_or_else(|| Delimiters::from_header_line(header_line));

        let segments = lines
            .iter()
            .map(|line| split_segment(line, &delimiters))
            .collect();

        Ok(Self {
            segments,
            delimiters,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// First segment with the given type code.
    pub fn segment(&self, code: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.code == code)
    }

    /// All segments with the given type code, in message order.
    pub fn segments_of<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Segment> {
        self.segments.iter().filter(move |s| s.code == code)
    }

    /// The MSH header segment. Guaranteed present by construction.
    pub fn header(&self) -> &Segment {
        // parse() refuses messages without an MSH segment.
        self.segment("MSH")
            .unwrap_or(&self.segments[0])
    }

    pub fn delimiters(&self) -> Delimiters {
        self.delimiters
    }
}

fn split_segment(line: &str, delimiters: &Delimiters) -> Segment {
    let parts: Vec<&str> = line.split(delimiters.field).collect();
    let code = parts[0].to_string();

    let fields: Vec<String> = if code == "MSH" {
        // MSH-1 is the field separator itself; the split parts after the
        // code start at MSH-2. Reinsert MSH-1 so indices line up.
        std::iter::once(delimiters.field.to_string())
            .chain(parts[1..].iter().map(|p| p.to_string()))
            .collect()
    } else {
        parts[1..].iter().map(|p| p.to_string()).collect()
    };

    Segment::new(code, fields, delimiters.component)
}
