//! Generic column encodings of a single field.

use chrono::{Duration, NaiveTime, Timelike};
use tracing::{debug, warn};

use super::buffer::SqlBuffer;
use super::SqlParam;
use crate::searchxml::{
    format_iso_date, format_iso_date_time, parse_iso_date_time, Relation, SearchXmlCachingReader,
};

/// Compiles the value of the current field into a SQL predicate on one
/// column. Every `add_*` method returns `false` when it declined; the
/// buffer content is then meaningless and must be discarded by the caller.
pub(crate) struct FieldQueryBuilder<'b, 'x> {
    pub(crate) sql: &'b mut SqlBuffer,
    pub(crate) reader: &'b mut SearchXmlCachingReader<'x>,
    pub(crate) relation: Relation,
}

impl<'b, 'x> FieldQueryBuilder<'b, 'x> {
    pub(crate) fn new(
        sql: &'b mut SqlBuffer,
        reader: &'b mut SearchXmlCachingReader<'x>,
        relation: Relation,
    ) -> Self {
        Self {
            sql,
            reader,
            relation,
        }
    }

    pub(crate) fn add_int_field(&mut self, column: &str) -> bool {
        self.add_numeric_field(
            column,
            SearchXmlCachingReader::value_to_int,
            SearchXmlCachingReader::value_to_int_list,
        )
    }

    pub(crate) fn add_long_field(&mut self, column: &str) -> bool {
        self.add_numeric_field(
            column,
            SearchXmlCachingReader::value_to_long_long,
            SearchXmlCachingReader::value_to_long_long_list,
        )
    }

    pub(crate) fn add_double_field(&mut self, column: &str) -> bool {
        self.add_numeric_field(
            column,
            SearchXmlCachingReader::value_to_double,
            SearchXmlCachingReader::value_to_double_list,
        )
    }

    pub(crate) fn add_string_field(&mut self, column: &str) -> bool {
        let value = self.reader.value();
        self.add_comparison(column, self.prepare_for_like(&value));
        true
    }

    pub(crate) fn add_date_field(&mut self, column: &str) -> bool {
        if self.relation == Relation::Equal {
            let text = self.reader.value();
            let Some(date) = parse_iso_date_time(&text) else {
                warn!("Date '{}' is invalid", text);
                return false;
            };

            let window = if date.time() == NaiveTime::MIN {
                // Day precision: everything on that calendar day
                date.date()
                    .pred_opt()
                    .zip(date.date().succ_opt())
                    .map(|(before, after)| (format_iso_date(&before), format_iso_date(&after)))
            } else {
                let seconds = if date.minute() == 0 && date.second() == 0 {
                    3600
                } else if date.second() == 0 {
                    60
                } else {
                    1
                };
                let delta = Duration::seconds(seconds);
                date.checked_sub_signed(delta)
                    .zip(date.checked_add_signed(delta))
                    .map(|(before, after)| {
                        (format_iso_date_time(&before), format_iso_date_time(&after))
                    })
            };

            let Some((start, end)) = window else {
                warn!("Date '{}' is out of range", text);
                return false;
            };

            self.sql.push_str(&format!(" ({} > ? AND {} < ?) ", column, column));
            self.sql.bind(start);
            self.sql.bind(end);
            true
        } else if self.relation.is_interval() {
            let values = self.reader.value_to_string_list();
            self.add_interval(column, values)
        } else {
            let value = self.reader.value();
            self.add_comparison(column, value);
            true
        }
    }

    pub(crate) fn add_choice_int_field(&mut self, column: &str) -> bool {
        if self.relation != Relation::OneOf {
            return self.add_int_field(column);
        }

        let mut values = self.reader.value_to_int_list();
        let search_for_null = values.contains(&-1);
        values.retain(|value| *value != -1);

        if values.is_empty() && !search_for_null {
            debug!("List for OneOf is empty");
            return false;
        }

        self.sql.push_str(" (");
        if !values.is_empty() {
            self.sql.push_str(&format!("{} IN (", column));
            self.sql.add_placeholders(values.len());
            self.sql.push_str(")");
            for value in values.iter() {
                self.sql.bind(*value);
            }
        }
        if search_for_null {
            if !values.is_empty() {
                self.sql.push_str(" OR ");
            }
            self.sql.push_str(&format!("{} IS NULL", column));
        }
        self.sql.push_str(" ) ");
        true
    }

    pub(crate) fn add_long_list_field(&mut self, column: &str) -> bool {
        if self.relation != Relation::OneOf {
            return self.add_long_field(column);
        }

        let values = self.reader.value_to_long_long_list();
        if values.is_empty() {
            debug!("List for OneOf is empty");
            return false;
        }

        self.sql.push_str(&format!(" ({} IN (", column));
        self.sql.add_placeholders(values.len());
        self.sql.push_str(") ) ");
        for value in values {
            self.sql.bind(value);
        }
        true
    }

    pub(crate) fn add_int_bitmask_field(&mut self, column: &str) -> bool {
        if self.relation != Relation::OneOf {
            let value = self.reader.value_to_int();
            if self.relation == Relation::Equal {
                self.sql.push_str(&format!(" ({} & ?) ", column));
            } else {
                self.sql.push_str(&format!(" (NOT {} & ?) ", column));
            }
            self.sql.bind(value);
            return true;
        }

        let mut values = self.reader.value_to_int_list();
        let search_for_null = values.contains(&-1);
        values.retain(|value| *value != -1);

        if values.is_empty() && !search_for_null {
            debug!("List for OneOf is empty");
            return false;
        }

        let mut terms: Vec<String> = values.iter().map(|_| format!("{} & ?", column)).collect();
        if search_for_null {
            terms.push(format!("{} IS NULL", column));
        }

        self.sql.push_str(&format!(" ( {} ) ", terms.join(" OR ")));
        for value in values {
            self.sql.bind(value);
        }
        true
    }

    pub(crate) fn add_choice_string_field(&mut self, column: &str) -> bool {
        if self.relation != Relation::OneOf {
            return self.add_string_field(column);
        }

        let values = self.reader.value_to_string_list();
        if values.is_empty() {
            debug!("List for OneOf is empty");
            return false;
        }

        let (wildcards, exact): (Vec<String>, Vec<String>) =
            values.into_iter().partition(|value| value.contains('*'));

        let mut terms = Vec::new();
        if !exact.is_empty() {
            terms.push(format!(
                "{} IN ({})",
                column,
                super::buffer::bound_value_placeholders(exact.len())
            ));
        }
        terms.extend(wildcards.iter().map(|_| format!("{} LIKE ?", column)));

        self.sql.push_str(&format!(" ({}) ", terms.join(" OR ")));
        for value in exact {
            self.sql.bind(value);
        }
        for value in wildcards {
            self.sql.bind(value.replace('*', "%"));
        }
        true
    }

    /// Bound value for a string comparison under the current relation.
    ///
    /// Like/NotLike values get `%` on both sides unless they carry their own
    /// `*` wildcards, which are translated instead.
    pub(crate) fn prepare_for_like(&self, value: &str) -> String {
        prepare_for_like(self.relation, value)
    }

    /// `(col REL ?)` with a single bound value.
    pub(crate) fn add_comparison(&mut self, column: &str, value: impl Into<SqlParam>) {
        self.sql.push_str(&format!(" ({} ", column));
        self.sql.add_relation(self.relation);
        self.sql.push_str(" ?) ");
        self.sql.bind(value);
    }

    /// Closed or open range over two values.
    pub(crate) fn add_interval<T: Into<SqlParam>>(&mut self, column: &str, values: Vec<T>) -> bool {
        if values.len() != 2 {
            warn!(
                "Relation {} requires a list of two values",
                self.relation.as_str()
            );
            return false;
        }

        let (lower, upper) = if self.relation == Relation::Interval {
            (">=", "<=")
        } else {
            (">", "<")
        };

        self.sql.push_str(&format!(
            " ({} {} ? AND {} {} ?) ",
            column, lower, column, upper
        ));
        for value in values {
            self.sql.bind(value);
        }
        true
    }

    fn add_numeric_field<T: Into<SqlParam>>(
        &mut self,
        column: &str,
        read_value: fn(&mut SearchXmlCachingReader<'x>) -> T,
        read_list: fn(&mut SearchXmlCachingReader<'x>) -> Vec<T>,
    ) -> bool {
        if self.relation.is_interval() {
            let values = read_list(self.reader);
            self.add_interval(column, values)
        } else {
            let value = read_value(self.reader);
            self.add_comparison(column, value);
            true
        }
    }
}

/// Like [`FieldQueryBuilder::prepare_for_like`] for an explicit relation.
pub(crate) fn prepare_for_like(relation: Relation, value: &str) -> String {
    if !relation.is_like() {
        value.to_string()
    } else if value.contains('*') {
        value.replace('*', "%")
    } else {
        format!("%{}%", value)
    }
}
