//! Streaming reader for the serialized search format.
//!
//! Forward-only: field and group properties are read from the element the
//! cursor is positioned on and become invalid with the next `read_next()`.
//! Callers that need them longer should use [`SearchXmlCachingReader`].
//!
//! [`SearchXmlCachingReader`]: super::SearchXmlCachingReader

use chrono::{NaiveDate, NaiveDateTime};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::types::{Element, Operator, Relation};
use crate::SearchError;

pub(crate) const SEARCH: &str = "search";
pub(crate) const GROUP: &str = "group";
pub(crate) const FIELD: &str = "field";
pub(crate) const LISTITEM: &str = "listitem";

/// Low-level token the cursor is positioned on.
#[derive(Debug, Clone, PartialEq)]
enum Token {
    StartDocument,
    StartElement {
        name: String,
        attributes: Vec<(String, String)>,
    },
    EndElement {
        name: String,
    },
    Characters(String),
    EndDocument,
}

/// Forward-only reader producing [`Element`] events.
pub struct SearchXmlReader<'a> {
    xml: Reader<&'a [u8]>,
    token: Token,
    /// `fieldoperator` of every open group, innermost last
    default_field_operators: Vec<Operator>,
    error: Option<SearchError>,
}

impl<'a> SearchXmlReader<'a> {
    /// Create a reader and position it on the root `<search>` element.
    pub fn new(xml: &'a str) -> Self {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().expand_empty_elements = true;

        let mut this = Self {
            xml: reader,
            token: Token::StartDocument,
            default_field_operators: Vec::new(),
            error: None,
        };

        // read in root element "search"
        this.read_next();
        this
    }

    /// Advance to the next group/field boundary or the root element.
    pub fn read_next(&mut self) -> Element {
        while !self.at_end() {
            self.advance();

            if self.is_end_element() {
                if self.is_group_element() {
                    self.default_field_operators.pop();
                    return Element::GroupEnd;
                } else if self.is_field_element() {
                    return Element::FieldEnd;
                }
            }

            if self.is_start_element() {
                if self.is_group_element() {
                    let op = self.read_operator("fieldoperator", Operator::standard_field());
                    self.default_field_operators.push(op);
                    return Element::Group;
                } else if self.is_field_element() {
                    return Element::Field;
                } else if self.name() == SEARCH {
                    return Element::Search;
                }
            }
        }

        Element::End
    }

    /// True once the document end (or a parse error) has been reached.
    pub fn at_end(&self) -> bool {
        matches!(self.token, Token::EndDocument)
    }

    /// The parse error that terminated the stream, if any.
    pub fn error(&self) -> Option<&SearchError> {
        self.error.as_ref()
    }

    pub fn is_start_element(&self) -> bool {
        matches!(self.token, Token::StartElement { .. })
    }

    pub fn is_end_element(&self) -> bool {
        matches!(self.token, Token::EndElement { .. })
    }

    pub fn is_group_element(&self) -> bool {
        self.name() == GROUP
    }

    pub fn is_field_element(&self) -> bool {
        self.name() == FIELD
    }

    /// Value of an attribute on the current start element.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes()
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub(crate) fn attributes(&self) -> &[(String, String)] {
        match &self.token {
            Token::StartElement { attributes, .. } => attributes,
            _ => &[],
        }
    }

    pub fn group_operator(&self) -> Operator {
        self.read_operator("operator", Operator::standard_group())
    }

    pub fn group_caption(&self) -> String {
        self.attribute("caption").unwrap_or_default().to_string()
    }

    /// Field operator default of the innermost open group.
    pub fn default_field_operator(&self) -> Operator {
        self.default_field_operators
            .last()
            .copied()
            .unwrap_or_else(Operator::standard_field)
    }

    pub fn field_operator(&self) -> Operator {
        self.read_operator("operator", self.default_field_operator())
    }

    pub fn field_name(&self) -> &str {
        self.attribute("name").unwrap_or_default()
    }

    pub fn field_relation(&self) -> Relation {
        self.attribute("relation")
            .and_then(Relation::parse)
            .unwrap_or_else(Relation::standard)
    }

    /// Read the field's text content, leaving the cursor on the field end.
    pub fn value(&mut self) -> String {
        self.read_element_text()
    }

    pub fn value_to_int(&mut self) -> i32 {
        parse_int(&self.read_element_text())
    }

    pub fn value_to_long_long(&mut self) -> i64 {
        parse_long_long(&self.read_element_text())
    }

    pub fn value_to_double(&mut self) -> f64 {
        parse_double(&self.read_element_text())
    }

    /// ISO 8601 date-time; `None` if the text is not a valid date.
    pub fn value_to_date_time(&mut self) -> Option<NaiveDateTime> {
        parse_iso_date_time(&self.read_element_text())
    }

    pub fn value_to_int_list(&mut self) -> Vec<i32> {
        self.read_list().iter().map(|s| parse_int(s)).collect()
    }

    pub fn value_to_long_long_list(&mut self) -> Vec<i64> {
        self.read_list().iter().map(|s| parse_long_long(s)).collect()
    }

    pub fn value_to_double_list(&mut self) -> Vec<f64> {
        self.read_list().iter().map(|s| parse_double(s)).collect()
    }

    pub fn value_to_string_list(&mut self) -> Vec<String> {
        self.read_list()
    }

    /// Invalid entries are dropped.
    pub fn value_to_date_time_list(&mut self) -> Vec<NaiveDateTime> {
        self.read_list()
            .iter()
            .filter_map(|s| parse_iso_date_time(s))
            .collect()
    }

    /// Accepts either plain text (one element) or a list of items.
    pub fn value_to_int_or_int_list(&mut self) -> Vec<i32> {
        self.read_scalar_or_list().iter().map(|s| parse_int(s)).collect()
    }

    pub fn value_to_double_or_double_list(&mut self) -> Vec<f64> {
        self.read_scalar_or_list()
            .iter()
            .map(|s| parse_double(s))
            .collect()
    }

    pub fn value_to_string_or_string_list(&mut self) -> Vec<String> {
        self.read_scalar_or_list()
    }

    /// Scan forward inside the current element for a start element named
    /// `element_name`. Never leaves the current subtree.
    pub fn read_to_start_of_element(&mut self, element_name: &str) -> bool {
        // go to next start element
        while !self.is_start_element() {
            if self.at_end() {
                return false;
            }
            self.advance();
        }

        let mut stack = 1usize;

        loop {
            self.advance();

            match &self.token {
                Token::StartElement { name, .. } => {
                    if name == element_name {
                        return true;
                    }
                    stack += 1;
                }
                Token::EndElement { .. } => {
                    stack -= 1;
                    if stack == 0 {
                        return false;
                    }
                }
                Token::EndDocument => return false,
                _ => {}
            }
        }
    }

    /// Skip the rest of the current element, stopping on its end tag.
    pub fn read_to_end_of_element(&mut self) {
        if !self.is_start_element() {
            return;
        }

        if self.is_group_element() {
            self.default_field_operators.pop();
        }

        let mut stack = 1usize;

        loop {
            self.advance();

            match &self.token {
                Token::StartElement { .. } => stack += 1,
                Token::EndElement { .. } => {
                    stack -= 1;
                    if stack == 0 {
                        return;
                    }
                }
                Token::EndDocument => return,
                _ => {}
            }
        }
    }

    /// Advance to the first field of the first group.
    pub fn read_to_first_field(&mut self) {
        let mut has_group = false;

        while !self.at_end() {
            match self.read_next() {
                Element::Group => has_group = true,
                Element::Field if has_group => return,
                _ => {}
            }
        }
    }

    fn name(&self) -> &str {
        match &self.token {
            Token::StartElement { name, .. } | Token::EndElement { name } => name,
            _ => "",
        }
    }

    fn read_operator(&self, attribute: &str, default_operator: Operator) -> Operator {
        self.attribute(attribute)
            .and_then(Operator::parse)
            .unwrap_or(default_operator)
    }

    /// Move to the next token, skipping declarations, comments and
    /// processing instructions.
    fn advance(&mut self) {
        if self.at_end() {
            return;
        }

        loop {
            let token = match self.xml.read_event() {
                // empty elements arrive expanded into Start/End pairs
                Ok(Event::Start(start)) | Ok(Event::Empty(start)) => start_element(&start),
                Ok(Event::End(end)) => Token::EndElement {
                    name: String::from_utf8_lossy(end.name().as_ref()).into_owned(),
                },
                Ok(Event::Text(text)) => match text.unescape() {
                    Ok(text) => Token::Characters(text.into_owned()),
                    Err(e) => {
                        self.fail(format!("invalid character data: {}", e));
                        return;
                    }
                },
                Ok(Event::CData(data)) => {
                    Token::Characters(String::from_utf8_lossy(&data).into_owned())
                }
                Ok(Event::Eof) => Token::EndDocument,
                Ok(_) => continue,
                Err(e) => {
                    self.fail(format!(
                        "error at position {}: {}",
                        self.xml.buffer_position(),
                        e
                    ));
                    return;
                }
            };

            self.token = token;
            return;
        }
    }

    fn fail(&mut self, message: String) {
        tracing::warn!("Search XML is malformed: {}", message);
        self.error = Some(SearchError::Xml(message));
        self.token = Token::EndDocument;
    }

    /// Concatenated text of the current element, cursor ends on its end tag.
    fn read_element_text(&mut self) -> String {
        if !self.is_start_element() {
            return String::new();
        }

        let mut text = String::new();
        let mut depth = 0usize;

        loop {
            self.advance();

            match &self.token {
                Token::Characters(chars) => text.push_str(chars),
                Token::StartElement { .. } => depth += 1,
                Token::EndElement { .. } => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                Token::EndDocument => break,
                Token::StartDocument => {}
            }
        }

        text
    }

    /// Text of consecutive `<listitem>` siblings.
    fn read_list(&mut self) -> Vec<String> {
        let mut list = Vec::new();

        loop {
            self.advance();

            match &self.token {
                Token::Characters(chars) if chars.trim().is_empty() => continue,
                Token::StartElement { name, .. } if name == LISTITEM => {}
                _ => break,
            }

            list.push(self.read_element_text());
        }

        list
    }

    /// Peek at the content: plain text is a one-element list, otherwise
    /// the `<listitem>` children are read.
    fn read_scalar_or_list(&mut self) -> Vec<String> {
        let mut text = String::new();

        self.advance();
        while let Token::Characters(chars) = &self.token {
            text.push_str(chars);
            self.advance();
        }

        let mut list = Vec::new();

        while self.is_start_element() && self.name() == LISTITEM {
            list.push(self.read_element_text());

            self.advance();
            while matches!(&self.token, Token::Characters(chars) if chars.trim().is_empty()) {
                self.advance();
            }
        }

        if list.is_empty() && !text.is_empty() {
            list.push(text);
        }

        list
    }
}

fn start_element(start: &BytesStart<'_>) -> Token {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();

    let attributes = start
        .attributes()
        .filter_map(|attribute| match attribute {
            Ok(attribute) => {
                let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
                match attribute.unescape_value() {
                    Ok(value) => Some((key, value.into_owned())),
                    Err(e) => {
                        tracing::warn!("Ignoring attribute {} on <{}>: {}", key, name, e);
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Ignoring malformed attribute on <{}>: {}", name, e);
                None
            }
        })
        .collect();

    Token::StartElement { name, attributes }
}

// Lenient number parsing: unparsable text reads as zero.

pub(crate) fn parse_int(text: &str) -> i32 {
    text.trim().parse().unwrap_or_default()
}

pub(crate) fn parse_long_long(text: &str) -> i64 {
    text.trim().parse().unwrap_or_default()
}

pub(crate) fn parse_double(text: &str) -> f64 {
    text.trim().parse().unwrap_or_default()
}

/// Parse `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM[:SS[.fff]]`, optionally `Z`-suffixed.
pub fn parse_iso_date_time(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    let text = text.strip_suffix('Z').unwrap_or(text);

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(date_time) = NaiveDateTime::parse_from_str(text, format) {
            return Some(date_time);
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// ISO 8601 text with second precision, as written by the writer.
pub fn format_iso_date_time(date_time: &NaiveDateTime) -> String {
    date_time.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// ISO 8601 date without time of day.
pub fn format_iso_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<search>
  <group operator="and" fieldoperator="or" caption="Holiday">
    <field name="rating" relation="greaterthan">3</field>
    <field name="filename" relation="like" operator="andnot">img &amp; co</field>
  </group>
  <group>
    <field name="albumid" relation="oneof"><listitem>1</listitem><listitem>5</listitem></field>
  </group>
</search>"#;

    #[test]
    fn test_reads_root_on_construction() {
        let mut reader = SearchXmlReader::new(DOC);
        assert!(reader.is_start_element());
        assert_eq!(reader.read_next(), Element::Group);
    }

    #[test]
    fn test_group_and_field_properties() {
        let mut reader = SearchXmlReader::new(DOC);

        assert_eq!(reader.read_next(), Element::Group);
        assert_eq!(reader.group_operator(), Operator::And);
        assert_eq!(reader.group_caption(), "Holiday");
        assert_eq!(reader.default_field_operator(), Operator::Or);

        assert_eq!(reader.read_next(), Element::Field);
        assert_eq!(reader.field_name(), "rating");
        assert_eq!(reader.field_relation(), Relation::GreaterThan);
        // inherits the group's default field operator
        assert_eq!(reader.field_operator(), Operator::Or);
        assert_eq!(reader.value_to_int(), 3);

        assert_eq!(reader.read_next(), Element::Field);
        assert_eq!(reader.field_operator(), Operator::AndNot);
        assert_eq!(reader.value(), "img & co");

        assert_eq!(reader.read_next(), Element::GroupEnd);
    }

    #[test]
    fn test_defaults_when_attributes_missing() {
        let mut reader = SearchXmlReader::new(DOC);
        reader.read_next();
        reader.read_to_end_of_element();
        assert_eq!(reader.read_next(), Element::Group);
        assert_eq!(reader.group_operator(), Operator::Or);
        assert_eq!(reader.default_field_operator(), Operator::And);
        assert_eq!(reader.read_next(), Element::Field);
        assert_eq!(reader.field_operator(), Operator::And);
        assert_eq!(reader.value_to_int_list(), vec![1, 5]);
        assert_eq!(reader.read_next(), Element::GroupEnd);
        assert_eq!(reader.read_next(), Element::End);
        assert!(reader.at_end());
        assert!(reader.error().is_none());
    }

    #[test]
    fn test_default_field_operator_restored_after_subgroup() {
        let xml = r#"<search><group fieldoperator="or"><group fieldoperator="andnot"><field name="a">1</field></group><field name="b">2</field></group></search>"#;
        let mut reader = SearchXmlReader::new(xml);

        assert_eq!(reader.read_next(), Element::Group);
        assert_eq!(reader.read_next(), Element::Group);
        assert_eq!(reader.read_next(), Element::Field);
        assert_eq!(reader.field_operator(), Operator::AndNot);
        reader.value();
        assert_eq!(reader.read_next(), Element::GroupEnd);
        assert_eq!(reader.read_next(), Element::Field);
        assert_eq!(reader.field_operator(), Operator::Or);
    }

    #[test]
    fn test_unknown_relation_falls_back_to_equal() {
        let xml = r#"<search><group><field name="x" relation="bogus">1</field></group></search>"#;
        let mut reader = SearchXmlReader::new(xml);
        reader.read_to_first_field();
        assert_eq!(reader.field_relation(), Relation::Equal);
    }

    #[test]
    fn test_unread_field_reports_field_end() {
        let xml = r#"<search><group><field name="x">1</field></group></search>"#;
        let mut reader = SearchXmlReader::new(xml);
        assert_eq!(reader.read_next(), Element::Group);
        assert_eq!(reader.read_next(), Element::Field);
        assert_eq!(reader.read_next(), Element::FieldEnd);
        assert_eq!(reader.read_next(), Element::GroupEnd);
    }

    #[test]
    fn test_list_with_whitespace_between_items() {
        let xml = "<search><group><field name=\"position\" relation=\"inside\">\n  <listitem>1.5</listitem>\n  <listitem>-2.25</listitem>\n</field></group></search>";
        let mut reader = SearchXmlReader::new(xml);
        reader.read_to_first_field();
        assert_eq!(reader.value_to_double_list(), vec![1.5, -2.25]);
        assert!(reader.is_end_element());
        assert!(reader.is_field_element());
    }

    #[test]
    fn test_scalar_or_list_with_scalar() {
        let xml = r#"<search><group><field name="tagid" relation="intree">7</field></group></search>"#;
        let mut reader = SearchXmlReader::new(xml);
        reader.read_to_first_field();
        assert_eq!(reader.value_to_int_or_int_list(), vec![7]);
        assert!(reader.is_end_element());
        assert_eq!(reader.read_next(), Element::GroupEnd);
    }

    #[test]
    fn test_scalar_or_list_with_list() {
        let xml = r#"<search><group><field name="tagid" relation="intree"><listitem>7</listitem><listitem>8</listitem></field></group></search>"#;
        let mut reader = SearchXmlReader::new(xml);
        reader.read_to_first_field();
        assert_eq!(reader.value_to_int_or_int_list(), vec![7, 8]);
        assert_eq!(reader.read_next(), Element::GroupEnd);
    }

    #[test]
    fn test_scalar_or_list_empty_field() {
        let xml = r#"<search><group><field name="tagid" relation="intree"/></group></search>"#;
        let mut reader = SearchXmlReader::new(xml);
        reader.read_to_first_field();
        assert!(reader.value_to_string_or_string_list().is_empty());
        assert_eq!(reader.read_next(), Element::GroupEnd);
    }

    #[test]
    fn test_read_to_start_of_element_stays_in_subtree() {
        let xml = r#"<search><group><field name="a">1</field></group><group><field name="b">2</field></group></search>"#;
        let mut reader = SearchXmlReader::new(xml);
        assert_eq!(reader.read_next(), Element::Group);
        assert!(reader.read_to_start_of_element("field"));
        assert_eq!(reader.field_name(), "a");

        // positioned on a field: no listitem inside, must not escape the field
        assert!(!reader.read_to_start_of_element("listitem"));
        assert!(reader.is_end_element());
    }

    #[test]
    fn test_read_to_end_of_element_skips_subtree() {
        let xml = r#"<search><group><group><field name="a">1</field></group></group><group caption="next"/></search>"#;
        let mut reader = SearchXmlReader::new(xml);
        assert_eq!(reader.read_next(), Element::Group);
        reader.read_to_end_of_element();
        assert!(reader.is_end_element());
        assert_eq!(reader.read_next(), Element::Group);
        assert_eq!(reader.group_caption(), "next");
    }

    #[test]
    fn test_malformed_document_ends_stream() {
        let xml = r#"<search><group><field name="a">1</group></search>"#;
        let mut reader = SearchXmlReader::new(xml);
        let mut guard = 0;
        while !reader.at_end() && guard < 20 {
            reader.read_next();
            guard += 1;
        }
        assert!(reader.at_end());
        assert!(matches!(reader.error(), Some(SearchError::Xml(_))));
    }

    #[test]
    fn test_parse_iso_date_time() {
        let dt = parse_iso_date_time("2008-01-09T12:30:05").unwrap();
        assert_eq!(format_iso_date_time(&dt), "2008-01-09T12:30:05");

        let day = parse_iso_date_time("2008-01-09").unwrap();
        assert_eq!(format_iso_date_time(&day), "2008-01-09T00:00:00");

        assert!(parse_iso_date_time("2008-01-09T12:30:05.250Z").is_some());
        assert!(parse_iso_date_time("yesterday").is_none());
    }

    #[test]
    fn test_lenient_number_parsing() {
        assert_eq!(parse_int(" 42 "), 42);
        assert_eq!(parse_int("abc"), 0);
        assert_eq!(parse_double("1e+06"), 1_000_000.0);
    }
}
