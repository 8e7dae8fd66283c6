//! Free-text keyword searches.
//!
//! A keyword search is a document with one default-operator group holding
//! only `keyword` fields with the `like` relation. The helpers here convert
//! between such documents and the text a user types into a search box.

use super::reader::SearchXmlReader;
use super::types::{Element, Operator, Relation};
use super::writer::SearchXmlWriter;

pub const KEYWORD_FIELD: &str = "keyword";

/// Split free text into keywords. Text between a pair of double quotes is
/// kept as one keyword, everything else is split on whitespace.
pub fn split(keywords: &str) -> Vec<String> {
    let mut list = Vec::new();

    // the part before the first quote is always outside, even if empty
    for (index, part) in keywords.split('"').enumerate() {
        if index % 2 == 1 {
            if !part.is_empty() {
                list.push(part.to_string());
            }
        } else {
            list.extend(part.split_whitespace().map(str::to_string));
        }
    }

    list
}

/// Join keywords into free text, quoting those that contain a space.
pub fn merge<S: AsRef<str>>(keywords: &[S]) -> String {
    keywords
        .iter()
        .map(|keyword| quote(keyword.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Append one keyword to existing free text.
pub fn merge_entry(previous: &str, entry: &str) -> String {
    if previous.is_empty() {
        return quote(entry);
    }
    format!("{} {}", previous, quote(entry))
}

fn quote(keyword: &str) -> String {
    if keyword.contains(' ') {
        format!("\"{}\"", keyword)
    } else {
        keyword.to_string()
    }
}

/// Reads keyword documents back.
pub struct KeywordSearchReader<'a> {
    reader: SearchXmlReader<'a>,
}

impl<'a> KeywordSearchReader<'a> {
    pub fn new(xml: &'a str) -> Self {
        Self {
            reader: SearchXmlReader::new(xml),
        }
    }

    /// Values of all `keyword` fields in document order. Consumes the reader.
    pub fn keywords(&mut self) -> Vec<String> {
        let mut list = Vec::new();

        while !self.reader.at_end() {
            if self.reader.read_next() == Element::Group {
                self.read_group(&mut list);
            }
        }

        list
    }

    /// Whether the document has exactly the shape [`KeywordSearchWriter`]
    /// produces. Consumes the reader.
    pub fn is_simple_keyword_search(&mut self) -> bool {
        let mut group_count = 0;

        while !self.reader.at_end() {
            if self.reader.read_next() == Element::Group {
                // only one group please
                group_count += 1;
                if group_count > 1 {
                    return false;
                }

                if !self.is_simple_keyword_search_group() {
                    return false;
                }
            }
        }

        true
    }

    fn read_group(&mut self, list: &mut Vec<String>) {
        while !self.reader.at_end() {
            match self.reader.read_next() {
                Element::Field => {
                    if self.reader.field_name() == KEYWORD_FIELD {
                        let value = self.reader.value();
                        if !value.is_empty() {
                            list.push(value);
                        }
                    }
                }
                Element::GroupEnd => return,
                _ => {}
            }
        }
    }

    fn is_simple_keyword_search_group(&mut self) -> bool {
        if self.reader.group_operator() != Operator::standard_group()
            || self.reader.default_field_operator() != Operator::standard_field()
        {
            return false;
        }

        while !self.reader.at_end() {
            match self.reader.read_next() {
                // subgroups not allowed
                Element::Group => return false,
                Element::Field => {
                    if self.reader.field_name() != KEYWORD_FIELD
                        || self.reader.field_relation() != Relation::Like
                        || self.reader.field_operator() != Operator::standard_field()
                    {
                        return false;
                    }
                }
                Element::GroupEnd => return true,
                _ => {}
            }
        }

        true
    }
}

/// Writes keyword documents, one field per keyword.
#[derive(Default)]
pub struct KeywordSearchWriter;

impl KeywordSearchWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn xml<S: AsRef<str>>(&self, keywords: &[S]) -> String {
        let mut writer = SearchXmlWriter::new();
        writer.write_group();

        for keyword in keywords {
            writer.write_field(KEYWORD_FIELD, Relation::Like);
            writer.write_value(keyword.as_ref());
            writer.finish_field();
        }

        writer.finish_group();
        writer.finish();
        writer.xml()
    }
}
