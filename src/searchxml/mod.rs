//! Searchxml module - the serialized search query language.
//!
//! A search is a `<search>` document of nested `<group>`s holding
//! `<field name=".." relation="..">` elements whose value is either text or
//! a sequence of `<listitem>`s. This module reads and writes that format.

mod caching;
pub mod keyword;
mod reader;
mod types;
mod writer;

pub use caching::SearchXmlCachingReader;
pub use keyword::{KeywordSearchReader, KeywordSearchWriter};
pub use reader::{format_iso_date, format_iso_date_time, parse_iso_date_time, SearchXmlReader};
pub use types::{Element, Operator, Relation};
pub use writer::{format_double, SearchXmlWriter, DEFAULT_DOUBLE_PRECISION};
