//! Builder for serialized search documents.
//!
//! Elements are opened lazily: a start tag stays pending until content, a
//! child or its end is written, so attributes can be added after
//! `write_group()` / `write_field()` returned.

use chrono::NaiveDateTime;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::reader::{format_iso_date_time, FIELD, GROUP, LISTITEM, SEARCH};
use super::types::{Operator, Relation};
use crate::SearchError;

/// Precision used by callers that have no better idea, same as `%g`.
pub const DEFAULT_DOUBLE_PRECISION: usize = 6;

pub struct SearchXmlWriter {
    writer: Writer<Vec<u8>>,
    pending: Option<BytesStart<'static>>,
    open: Vec<String>,
    error: Option<SearchError>,
}

impl SearchXmlWriter {
    /// Start a document with its declaration and an open `<search>` root.
    pub fn new() -> Self {
        let mut this = Self {
            writer: Writer::new(Vec::new()),
            pending: None,
            open: Vec::new(),
            error: None,
        };

        this.emit(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)));
        this.start(SEARCH);
        this
    }

    /// Add an attribute to the element opened last. Ignored once the
    /// element has content.
    pub fn write_attribute(&mut self, name: &str, value: &str) {
        match self.pending.as_mut() {
            Some(start) => start.push_attribute((name, value)),
            None => tracing::warn!(
                "Cannot add attribute {} after element content was written",
                name
            ),
        }
    }

    pub fn write_group(&mut self) {
        self.start(GROUP);
    }

    pub fn set_group_operator(&mut self, op: Operator) {
        if op != Operator::standard_group() {
            self.write_attribute("operator", op.as_str());
        }
    }

    pub fn set_group_caption(&mut self, caption: &str) {
        if !caption.is_empty() {
            self.write_attribute("caption", caption);
        }
    }

    pub fn set_default_field_operator(&mut self, op: Operator) {
        if op != Operator::standard_field() {
            self.write_attribute("fieldoperator", op.as_str());
        }
    }

    pub fn write_field(&mut self, name: &str, relation: Relation) {
        self.start(FIELD);
        self.write_attribute("name", name);
        self.write_attribute("relation", relation.as_str());
    }

    pub fn set_field_operator(&mut self, op: Operator) {
        self.write_attribute("operator", op.as_str());
    }

    pub fn write_value(&mut self, value: &str) {
        self.text(value);
    }

    pub fn write_int(&mut self, value: i32) {
        self.text(&value.to_string());
    }

    pub fn write_long_long(&mut self, value: i64) {
        self.text(&value.to_string());
    }

    pub fn write_double(&mut self, value: f64, precision: usize) {
        self.text(&format_double(value, precision));
    }

    pub fn write_date_time(&mut self, value: &NaiveDateTime) {
        self.text(&format_iso_date_time(value));
    }

    pub fn write_int_list(&mut self, values: &[i32]) {
        for value in values {
            self.write_list_item(&value.to_string());
        }
    }

    pub fn write_long_long_list(&mut self, values: &[i64]) {
        for value in values {
            self.write_list_item(&value.to_string());
        }
    }

    pub fn write_double_list(&mut self, values: &[f64], precision: usize) {
        for value in values {
            self.write_list_item(&format_double(*value, precision));
        }
    }

    pub fn write_date_time_list(&mut self, values: &[NaiveDateTime]) {
        for value in values {
            self.write_list_item(&format_iso_date_time(value));
        }
    }

    pub fn write_string_list<S: AsRef<str>>(&mut self, values: &[S]) {
        for value in values {
            self.write_list_item(value.as_ref());
        }
    }

    pub fn finish_field(&mut self) {
        self.end(FIELD);
    }

    pub fn finish_group(&mut self) {
        self.end(GROUP);
    }

    /// Close every element still open, including the root.
    pub fn finish(&mut self) {
        while !self.open.is_empty() {
            self.end_current();
        }
    }

    /// Document text. Incomplete unless `finish()` was called.
    pub fn xml(&self) -> String {
        String::from_utf8_lossy(self.writer.get_ref()).into_owned()
    }

    /// First write failure, if any.
    pub fn error(&self) -> Option<&SearchError> {
        self.error.as_ref()
    }

    /// A complete document searching for free-text keywords.
    pub fn keyword_search(keyword: &str) -> String {
        let mut writer = SearchXmlWriter::new();
        writer.write_group();
        writer.write_field("keyword", Relation::Like);
        writer.write_value(keyword);
        writer.finish_field();
        writer.finish_group();
        writer.finish();
        writer.xml()
    }

    fn write_list_item(&mut self, text: &str) {
        self.start(LISTITEM);
        self.text(text);
        self.end(LISTITEM);
    }

    fn start(&mut self, name: &str) {
        self.flush_pending();
        self.pending = Some(BytesStart::new(name.to_string()));
        self.open.push(name.to_string());
    }

    fn text(&mut self, text: &str) {
        self.flush_pending();
        self.emit(Event::Text(BytesText::new(text)));
    }

    fn end(&mut self, name: &str) {
        match self.open.last() {
            Some(current) if current == name => self.end_current(),
            Some(current) => tracing::warn!(
                "Unbalanced search XML: cannot close <{}> while <{}> is open",
                name,
                current
            ),
            None => tracing::warn!("Unbalanced search XML: no open <{}>", name),
        }
    }

    fn end_current(&mut self) {
        let Some(name) = self.open.pop() else {
            return;
        };

        match self.pending.take() {
            Some(start) => self.emit(Event::Empty(start)),
            None => self.emit(Event::End(BytesEnd::new(name))),
        }
    }

    fn flush_pending(&mut self) {
        if let Some(start) = self.pending.take() {
            self.emit(Event::Start(start));
        }
    }

    fn emit(&mut self, event: Event<'_>) {
        if let Err(e) = self.writer.write_event(event) {
            tracing::warn!("Failed to write search XML: {}", e);
            if self.error.is_none() {
                self.error = Some(SearchError::Xml(format!(
                    "Failed to write search XML: {}",
                    e
                )));
            }
        }
    }
}

impl Default for SearchXmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format like C `printf("%.*g")`: `precision` significant digits, trailing
/// zeros removed, exponent notation for very small or large magnitudes.
pub fn format_double(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let precision = precision.max(1);
    let scientific = format!("{:.*e}", precision - 1, value);

    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return value.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return value.to_string();
    };

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            trim_fraction_zeros(mantissa),
            sign,
            exponent.abs()
        )
    } else {
        let decimals = (precision as i32 - 1 - exponent) as usize;
        trim_fraction_zeros(&format!("{:.*}", decimals, value))
    }
}

fn trim_fraction_zeros(number: &str) -> String {
    if number.contains('.') {
        number
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        number.to_string()
    }
}
