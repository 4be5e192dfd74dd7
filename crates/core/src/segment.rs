//! Structural model of a pipe-delimited message template.
//!
//! Templates are parsed once into an ordered list of [`Segment`] records. Block duplication,
//! renumbering and observation stripping operate on that list, and the result is serialised
//! back to text. Splitting on `|` and joining again is lossless, so segments the renderer
//! never touches come out byte-for-byte as they went in.

use crate::fields::FieldValues;
use crate::render::fill_template;
use std::fmt;

pub const FIELD_SEPARATOR: char = '|';

/// Separator written between segments when a template is serialised.
pub const SEGMENT_SEPARATOR: &str = "\n";

/// One segment line: a tag followed by `|`-separated fields.
///
/// Fields are numbered from 1 by their position after the tag, which matches HL7 numbering
/// for every segment except `MSH` (where the field separator itself is MSH-1, so position
/// `n` here is MSH-`n+1`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    tag: String,
    fields: Vec<String>,
}

impl Segment {
    pub fn parse(line: &str) -> Self {
        let mut parts = line.split(FIELD_SEPARATOR);
        let tag = parts.next().unwrap_or_default().to_owned();
        let fields = parts.map(str::to_owned).collect();
        Self { tag, fields }
    }

    pub fn new(tag: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            tag: tag.into(),
            fields,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag == tag
    }

    /// Field at 1-based `position`, if present.
    pub fn field(&self, position: usize) -> Option<&str> {
        position
            .checked_sub(1)
            .and_then(|index| self.fields.get(index))
            .map(String::as_str)
    }

    /// Replace the field at 1-based `position`, padding with empty fields if needed.
    pub fn set_field(&mut self, position: usize, value: impl Into<String>) {
        let Some(index) = position.checked_sub(1) else {
            return;
        };
        if self.fields.len() <= index {
            self.fields.resize(index + 1, String::new());
        }
        self.fields[index] = value.into();
    }

    /// Component `component` (1-based, `^`-separated) of field `position`.
    pub fn component(&self, position: usize, component: usize) -> Option<&str> {
        let index = component.checked_sub(1)?;
        self.field(position)?.split('^').nth(index)
    }

    /// Replace component `component` of field `position`, padding with empty components.
    pub fn set_component(&mut self, position: usize, component: usize, value: impl Into<String>) {
        let Some(index) = component.checked_sub(1) else {
            return;
        };
        let mut components: Vec<String> = self
            .field(position)
            .unwrap_or_default()
            .split('^')
            .map(str::to_owned)
            .collect();
        if components.len() <= index {
            components.resize(index + 1, String::new());
        }
        components[index] = value.into();
        self.set_field(position, components.join("^"));
    }

    /// Sequence number held in the first field (`AIS|1|`, `NTE|2|`, …).
    pub fn sequence(&self) -> Option<u32> {
        self.field(1)?.trim().parse().ok()
    }

    pub fn set_sequence(&mut self, sequence: u32) {
        self.set_field(1, sequence.to_string());
    }

    pub fn has_sequence(&self, tag: &str, sequence: u32) -> bool {
        self.is(tag) && self.sequence() == Some(sequence)
    }

    /// Substitute placeholders inside every field, leaving the separators alone.
    pub fn fill(&mut self, values: &FieldValues) {
        self.tag = fill_template(&self.tag, values);
        for field in &mut self.fields {
            *field = fill_template(field, values);
        }
    }

    pub fn to_line(&self) -> String {
        let mut line = self.tag.clone();
        for field in &self.fields {
            line.push(FIELD_SEPARATOR);
            line.push_str(field);
        }
        line
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

/// A message template as an ordered list of segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageTemplate {
    segments: Vec<Segment>,
}

impl MessageTemplate {
    /// Parse template text. Accepts `\n`, `\r\n` and bare `\r` segment terminators and drops
    /// blank lines.
    pub fn parse(text: &str) -> Self {
        let segments = text
            .split(['\r', '\n'])
            .filter(|line| !line.trim().is_empty())
            .map(Segment::parse)
            .collect();
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn count(&self, tag: &str) -> usize {
        self.segments.iter().filter(|s| s.is(tag)).count()
    }

    pub fn first(&self, tag: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.is(tag))
    }

    /// Copy of the template with every `tag` segment removed.
    pub fn without(&self, tag: &str) -> Self {
        Self {
            segments: self
                .segments
                .iter()
                .filter(|s| !s.is(tag))
                .cloned()
                .collect(),
        }
    }

    pub(crate) fn insert_all(&mut self, at: usize, segments: Vec<Segment>) {
        self.segments.splice(at..at, segments);
    }

    pub(crate) fn replace(&mut self, at: usize, segments: Vec<Segment>) {
        self.segments.splice(at..=at, segments);
    }

    pub(crate) fn segments_mut(&mut self) -> &mut [Segment] {
        &mut self.segments
    }

    pub fn to_text(&self) -> String {
        self.segments
            .iter()
            .map(Segment::to_line)
            .collect::<Vec<_>>()
            .join(SEGMENT_SEPARATOR)
    }
}

impl fmt::Display for MessageTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for MessageTemplate {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}
