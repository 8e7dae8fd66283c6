//! Reader wrapper that memoizes group/field state between advances.

use chrono::NaiveDateTime;

use super::reader::{parse_double, parse_int, parse_iso_date_time, parse_long_long, SearchXmlReader};
use super::types::{Element, Operator, Relation};
use crate::SearchError;

#[derive(Debug, Clone, PartialEq)]
enum CachedValue {
    Scalar(String),
    List(Vec<String>),
}

/// Same read interface as [`SearchXmlReader`], but every group/field
/// property and the decoded field value stay valid until the next
/// `read_next()`, so accessors can be called repeatedly.
pub struct SearchXmlCachingReader<'a> {
    reader: SearchXmlReader<'a>,
    group_operator: Operator,
    group_caption: String,
    field_operator: Operator,
    field_name: String,
    field_relation: Relation,
    field_attributes: Vec<(String, String)>,
    value: Option<CachedValue>,
}

impl<'a> SearchXmlCachingReader<'a> {
    pub fn new(xml: &'a str) -> Self {
        Self::from_reader(SearchXmlReader::new(xml))
    }

    pub fn from_reader(reader: SearchXmlReader<'a>) -> Self {
        Self {
            reader,
            group_operator: Operator::standard_group(),
            group_caption: String::new(),
            field_operator: Operator::standard_field(),
            field_name: String::new(),
            field_relation: Relation::standard(),
            field_attributes: Vec::new(),
            value: None,
        }
    }

    pub fn read_next(&mut self) -> Element {
        let element = self.reader.read_next();

        match element {
            Element::Group => {
                self.group_operator = self.reader.group_operator();
                self.group_caption = self.reader.group_caption();
            }
            Element::Field => {
                self.field_operator = self.reader.field_operator();
                self.field_name = self.reader.field_name().to_string();
                self.field_relation = self.reader.field_relation();
                self.field_attributes = self.reader.attributes().to_vec();
                self.value = None;
            }
            _ => {}
        }

        element
    }

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

    pub fn read_to_start_of_element(&mut self, element_name: &str) -> bool {
        self.reader.read_to_start_of_element(element_name)
    }

    pub fn read_to_end_of_element(&mut self) {
        self.reader.read_to_end_of_element();
    }

    pub fn at_end(&self) -> bool {
        self.reader.at_end()
    }

    pub fn error(&self) -> Option<&SearchError> {
        self.reader.error()
    }

    pub fn is_start_element(&self) -> bool {
        self.reader.is_start_element()
    }

    pub fn is_field_element(&self) -> bool {
        self.reader.is_field_element()
    }

    /// True while positioned on a field start whose value was never read.
    pub fn is_unconsumed_field(&self) -> bool {
        self.reader.is_start_element() && self.reader.is_field_element()
    }

    pub fn group_operator(&self) -> Operator {
        self.group_operator
    }

    pub fn group_caption(&self) -> &str {
        &self.group_caption
    }

    pub fn default_field_operator(&self) -> Operator {
        self.reader.default_field_operator()
    }

    pub fn field_operator(&self) -> Operator {
        self.field_operator
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn field_relation(&self) -> Relation {
        self.field_relation
    }

    /// Attribute of the last field start element.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.field_attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn value(&mut self) -> String {
        if self.value.is_none() {
            self.value = Some(CachedValue::Scalar(self.reader.value()));
        }

        match &self.value {
            Some(CachedValue::Scalar(text)) => text.clone(),
            Some(CachedValue::List(list)) => list.first().cloned().unwrap_or_default(),
            None => String::new(),
        }
    }

    pub fn value_to_int(&mut self) -> i32 {
        parse_int(&self.value())
    }

    pub fn value_to_long_long(&mut self) -> i64 {
        parse_long_long(&self.value())
    }

    pub fn value_to_double(&mut self) -> f64 {
        parse_double(&self.value())
    }

    pub fn value_to_date_time(&mut self) -> Option<NaiveDateTime> {
        parse_iso_date_time(&self.value())
    }

    pub fn value_to_string_list(&mut self) -> Vec<String> {
        if self.value.is_none() {
            self.value = Some(CachedValue::List(self.reader.value_to_string_list()));
        }
        self.cached_list()
    }

    pub fn value_to_int_list(&mut self) -> Vec<i32> {
        self.value_to_string_list()
            .iter()
            .map(|s| parse_int(s))
            .collect()
    }

    pub fn value_to_long_long_list(&mut self) -> Vec<i64> {
        self.value_to_string_list()
            .iter()
            .map(|s| parse_long_long(s))
            .collect()
    }

    pub fn value_to_double_list(&mut self) -> Vec<f64> {
        self.value_to_string_list()
            .iter()
            .map(|s| parse_double(s))
            .collect()
    }

    pub fn value_to_date_time_list(&mut self) -> Vec<NaiveDateTime> {
        self.value_to_string_list()
            .iter()
            .filter_map(|s| parse_iso_date_time(s))
            .collect()
    }

    pub fn value_to_string_or_string_list(&mut self) -> Vec<String> {
        if self.value.is_none() {
            self.value = Some(CachedValue::List(
                self.reader.value_to_string_or_string_list(),
            ));
        }
        self.cached_list()
    }

    pub fn value_to_int_or_int_list(&mut self) -> Vec<i32> {
        self.value_to_string_or_string_list()
            .iter()
            .map(|s| parse_int(s))
            .collect()
    }

    pub fn value_to_double_or_double_list(&mut self) -> Vec<f64> {
        self.value_to_string_or_string_list()
            .iter()
            .map(|s| parse_double(s))
            .collect()
    }

    fn cached_list(&self) -> Vec<String> {
        match &self.value {
            Some(CachedValue::List(list)) => list.clone(),
            Some(CachedValue::Scalar(text)) if !text.is_empty() => vec![text.clone()],
            _ => Vec::new(),
        }
    }
}
