//! Legacy search URLs.
//!
//! Searches of old releases were stored as `digikamsearch:` URLs. The
//! query items hold numbered rules (`1.key`, `1.op`, `1.val`, ... and
//! `count`), the path combines rule numbers with `AND`, `OR` and
//! parentheses:
//!
//! ```text
//! digikamsearch:1 AND ( 2 OR 3 )?1.key=imagename&1.op=like&1.val=beach&...&count=3
//! ```
//!
//! Such a URL is normally converted to a search document and compiled like
//! any other search. The direct compiler is kept for callers that still
//! query the old schema.

use std::collections::HashMap;

use chrono::{Datelike, Duration, Local, NaiveDate};
use pest::Parser;
use pest_derive::Parser;
use tracing::{debug, warn};
use url::Url;

use super::{CompiledQuery, ImageQueryBuilder, PostHooks, SqlBuffer};
use crate::searchxml::{Operator, Relation, SearchXmlWriter};
use crate::{Result, SearchError};

#[derive(Parser)]
#[grammar = "query/legacy.pest"]
struct LegacyPathParser;

/// One element of a legacy URL path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathToken {
    /// Number of a rule in the query items
    Rule(i32),
    And,
    Or,
    Open,
    Close,
    /// Anything that is neither a rule number nor a connector
    Other(String),
}

/// Split a legacy URL path into rule references and connectors.
pub fn parse_path(path: &str) -> Result<Vec<PathToken>> {
    let pairs = LegacyPathParser::parse(Rule::path, path)
        .map_err(|e| SearchError::Url(format!("Failed to parse search path: {}", e)))?;

    let mut tokens = Vec::new();

    for pair in pairs.flatten() {
        let token = match pair.as_rule() {
            Rule::rule_ref => match pair.as_str().parse() {
                Ok(number) => PathToken::Rule(number),
                Err(_) => PathToken::Other(pair.as_str().to_string()),
            },
            Rule::and_op => PathToken::And,
            Rule::or_op => PathToken::Or,
            Rule::open_paren => PathToken::Open,
            Rule::close_paren => PathToken::Close,
            Rule::other => PathToken::Other(pair.as_str().to_string()),
            _ => continue,
        };
        tokens.push(token);
    }

    Ok(tokens)
}

/// A rule as found in the query items, key and op lowercased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct UrlRule {
    key: String,
    op: String,
    value: String,
}

#[derive(Debug)]
struct LegacyUrl {
    rules: HashMap<i32, UrlRule>,
    path: Vec<PathToken>,
}

/// `None` if the URL declares no rules.
fn parse_legacy_url(url: &str) -> Result<Option<LegacyUrl>> {
    let parsed = Url::parse(url)
        .map_err(|e| SearchError::Url(format!("Failed to parse search URL: {}", e)))?;

    // the first occurrence of an item wins
    let mut items: HashMap<String, String> = HashMap::new();
    for (key, value) in parsed.query_pairs() {
        items
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }

    let count: i32 = items
        .get("count")
        .and_then(|count| count.trim().parse().ok())
        .unwrap_or(0);

    if count <= 0 {
        return Ok(None);
    }

    let item = |number: i32, name: &str| {
        items
            .get(&format!("{}.{}", number, name))
            .cloned()
            .unwrap_or_default()
    };

    let rules = (1..=count)
        .map(|number| {
            let rule = UrlRule {
                key: item(number, "key").to_lowercase(),
                op: item(number, "op").to_lowercase(),
                value: item(number, "val"),
            };
            (number, rule)
        })
        .collect();

    let path = urlencoding::decode(parsed.path())
        .map_err(|e| SearchError::Url(format!("Failed to decode search path: {}", e)))?;

    Ok(Some(LegacyUrl {
        rules,
        path: parse_path(&path)?,
    }))
}

/// Field name of a legacy key in search documents.
fn converted_field_name(key: &str) -> &str {
    match key {
        "album" => "albumid",
        "imagename" => "filename",
        "imagecaption" => "comment",
        "imagedate" => "creationdate",
        "tag" => "tagid",
        // albumname, albumcaption, albumcollection, tagname, keyword, rating
        other => other,
    }
}

fn converted_relation(key: &str, op: &str) -> Option<Relation> {
    let relation = match op {
        "eq" => Relation::Equal,
        "ne" => Relation::Unequal,
        "lt" => Relation::LessThan,
        "lte" => Relation::LessThanOrEqual,
        "gt" => Relation::GreaterThan,
        "gte" => Relation::GreaterThanOrEqual,
        "like" if key == "tag" => Relation::InTree,
        "like" => Relation::Like,
        "nlike" if key == "tag" => Relation::NotInTree,
        "nlike" => Relation::NotLike,
        _ => return None,
    };
    Some(relation)
}

/// Rule keys understood by the direct compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LegacyKey {
    Album,
    AlbumName,
    AlbumCaption,
    AlbumCollection,
    Tag,
    TagName,
    ImageName,
    ImageCaption,
    ImageDate,
    Keyword,
    Rating,
}

impl LegacyKey {
    fn parse(key: &str) -> Option<Self> {
        let key = match key {
            "album" => LegacyKey::Album,
            "albumname" => LegacyKey::AlbumName,
            "albumcaption" => LegacyKey::AlbumCaption,
            "albumcollection" => LegacyKey::AlbumCollection,
            "tag" => LegacyKey::Tag,
            "tagname" => LegacyKey::TagName,
            "imagename" => LegacyKey::ImageName,
            "imagecaption" => LegacyKey::ImageCaption,
            "imagedate" => LegacyKey::ImageDate,
            "keyword" => LegacyKey::Keyword,
            "rating" => LegacyKey::Rating,
            _ => return None,
        };
        Some(key)
    }
}

/// Keys a keyword rule is matched against when it is not a date.
const KEYWORD_KEYS: [LegacyKey; 7] = [
    LegacyKey::AlbumName,
    LegacyKey::ImageName,
    LegacyKey::TagName,
    LegacyKey::AlbumCaption,
    LegacyKey::AlbumCollection,
    LegacyKey::ImageCaption,
    LegacyKey::Rating,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LegacyOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Like,
    NotLike,
    Lte,
    Gte,
}

impl LegacyOp {
    fn parse(op: &str) -> Option<Self> {
        let op = match op {
            "eq" => LegacyOp::Eq,
            "ne" => LegacyOp::Ne,
            "lt" => LegacyOp::Lt,
            "lte" => LegacyOp::Lte,
            "gt" => LegacyOp::Gt,
            "gte" => LegacyOp::Gte,
            "like" => LegacyOp::Like,
            "nlike" => LegacyOp::NotLike,
            _ => return None,
        };
        Some(op)
    }

    fn to_sql(self) -> &'static str {
        match self {
            LegacyOp::Eq => "=",
            LegacyOp::Ne => "<>",
            LegacyOp::Lt => "<",
            LegacyOp::Gt => ">",
            LegacyOp::Lte => "<=",
            LegacyOp::Gte => ">=",
            LegacyOp::Like => "LIKE",
            LegacyOp::NotLike => "NOT LIKE",
        }
    }

    fn is_like(self) -> bool {
        matches!(self, LegacyOp::Like | LegacyOp::NotLike)
    }
}

const LEGACY_TAG_TREE: &str = "   (SELECT ImageTags.imageid FROM ImageTags INNER JOIN TagsTree ON ImageTags.tagid = TagsTree.id     WHERE TagsTree.pid = ? or ImageTags.tagid = ? )) ";

impl ImageQueryBuilder {
    /// Convert a legacy search URL to a search document.
    ///
    /// Returns `Ok(None)` if the URL declares no rules. Rule numbers are
    /// grouped the way the path reads them: `OR` separates groups, `AND`
    /// continues the current one, parentheses open a subgroup.
    pub fn convert_from_url_to_xml(&self, url: &str) -> Result<Option<String>> {
        let Some(legacy) = parse_legacy_url(url)? else {
            return Ok(None);
        };

        let mut writer = SearchXmlWriter::new();

        // marks a search converted from the URL format
        writer.write_attribute("convertedFrom09Url", "true");
        writer.write_group();

        let mut open_parens = 0usize;

        for token in &legacy.path {
            match token {
                PathToken::Rule(number) => {
                    let Some(rule) = legacy.rules.get(number) else {
                        warn!("Search path refers to missing rule {}", number);
                        continue;
                    };

                    let relation = converted_relation(&rule.key, &rule.op).unwrap_or_else(|| {
                        warn!("Unknown operator '{}' in rule {}, using equal", rule.op, number);
                        Relation::standard()
                    });

                    writer.write_field(converted_field_name(&rule.key), relation);
                    writer.write_value(&rule.value);
                    writer.finish_field();
                }
                PathToken::And => {}
                PathToken::Or => {
                    writer.finish_group();
                    writer.write_group();
                    writer.set_group_operator(Operator::Or);
                }
                PathToken::Open => {
                    // a parenthesized term holds its own OR-separated groups
                    writer.write_group();
                    writer.set_group_operator(Operator::And);
                    writer.write_group();
                    open_parens += 1;
                }
                PathToken::Close => {
                    if open_parens == 0 {
                        warn!("Ignoring unbalanced ')' in search path");
                        continue;
                    }
                    writer.finish_group();
                    writer.finish_group();
                    open_parens -= 1;
                }
                PathToken::Other(word) => {
                    warn!("Ignoring unknown word '{}' in search path", word);
                }
            }
        }

        for _ in 0..open_parens {
            writer.finish_group();
            writer.finish_group();
        }

        writer.finish_group();
        writer.finish();

        if let Some(e) = writer.error() {
            return Err(SearchError::Xml(format!(
                "Failed to write converted search: {}",
                e
            )));
        }

        Ok(Some(writer.xml()))
    }

    /// Compile a legacy search URL directly against the old item schema
    /// (`Images.dirid`, `Images.caption`, `Images.datetime`, `ImageProperties`).
    ///
    /// Keyword rules that look like a date (an ISO date, a year or a month
    /// name) search the image date instead of the text columns.
    pub fn build_query_from_url(&self, url: &str) -> Result<CompiledQuery> {
        let Some(legacy) = parse_legacy_url(url)? else {
            return Ok(CompiledQuery::default());
        };

        let mut rules = HashMap::new();

        for (number, rule) in &legacy.rules {
            let Some(key) = LegacyKey::parse(&rule.key) else {
                warn!("Unknown rule type '{}' in legacy search", rule.key);
                continue;
            };
            let Some(op) = LegacyOp::parse(&rule.op) else {
                warn!("Unknown operator '{}' in legacy search", rule.op);
                continue;
            };
            rules.insert(*number, (key, op, rule.value.as_str()));
        }

        let mut sql = SqlBuffer::new();

        for token in &legacy.path {
            match token {
                PathToken::Rule(number) => {
                    let Some(&(key, op, value)) = rules.get(number) else {
                        warn!("Search path refers to missing rule {}", number);
                        sql.push_str(" 0 ");
                        continue;
                    };

                    if key != LegacyKey::Keyword {
                        add_legacy_rule(&mut sql, key, op, value);
                    } else if let Some((date, exact)) = self.possible_date(value) {
                        let op = if exact { LegacyOp::Eq } else { LegacyOp::Like };
                        add_legacy_rule(&mut sql, LegacyKey::ImageDate, op, &date);
                    } else {
                        sql.push_str("(");
                        for (index, key) in KEYWORD_KEYS.iter().enumerate() {
                            if index > 0 {
                                sql.push_str(" OR ");
                            }
                            add_legacy_rule(&mut sql, *key, op, value);
                        }
                        sql.push_str(")");
                    }
                }
                PathToken::And => sql.push_str(" AND "),
                PathToken::Or => sql.push_str(" OR "),
                PathToken::Open => sql.push_str(" ( "),
                PathToken::Close => sql.push_str(" ) "),
                PathToken::Other(word) => {
                    warn!("Ignoring unknown word '{}' in search path", word);
                }
            }
        }

        debug!("Compiled legacy search: {}", sql.sql());
        Ok(CompiledQuery::new(sql, PostHooks::new()))
    }

    /// Date pattern for a keyword, and whether it denotes one exact day.
    ///
    /// An ISO date is exact. A year between 1970 and the current year or a
    /// configured month name yields a LIKE pattern.
    pub fn possible_date(&self, keyword: &str) -> Option<(String, bool)> {
        if let Ok(date) = NaiveDate::parse_from_str(keyword, "%Y-%m-%d") {
            return Some((date.format("%Y-%m-%d").to_string(), true));
        }

        if let Ok(number) = keyword.parse::<i32>() {
            return (1970..=Local::now().year())
                .contains(&number)
                .then(|| (format!("{}-%-%", number), false));
        }

        self.config()
            .months
            .month_number(keyword)
            .map(|month| (format!("%-{:02}-%", month), false))
    }
}

fn add_legacy_rule(sql: &mut SqlBuffer, key: LegacyKey, op: LegacyOp, value: &str) {
    let pattern = if op.is_like() {
        format!("%{}%", value)
    } else {
        value.to_string()
    };

    let column = match key {
        LegacyKey::Album => " (Images.dirid ",
        LegacyKey::AlbumName => " (Images.dirid IN   (SELECT id FROM Albums WHERE url ",
        LegacyKey::AlbumCaption => " (Images.dirid IN   (SELECT id FROM Albums WHERE caption ",
        LegacyKey::AlbumCollection => {
            " (Images.dirid IN   (SELECT id FROM Albums WHERE collection "
        }
        LegacyKey::TagName => {
            " (Images.id IN   (SELECT imageid FROM ImageTags    WHERE tagid IN    (SELECT id FROM Tags WHERE name "
        }
        LegacyKey::ImageName => " (Images.name ",
        LegacyKey::ImageCaption => " (Images.caption ",
        LegacyKey::ImageDate => {
            if op == LegacyOp::Eq {
                if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
                    sql.push_str(" (Images.datetime > ? AND Images.datetime < ?) ");
                    sql.bind((date - Duration::days(1)).format("%Y-%m-%d").to_string());
                    sql.bind((date + Duration::days(1)).format("%Y-%m-%d").to_string());
                    return;
                }
            }
            " (Images.datetime "
        }
        LegacyKey::Rating => {
            sql.push_str(" (ImageProperties.value ");
            sql.push_str(op.to_sql());
            sql.push_str(" ? and ImageProperties.property='Rating') ");
            sql.bind(pattern);
            return;
        }
        LegacyKey::Tag => {
            let tag_id: i32 = value.trim().parse().unwrap_or_default();
            match op {
                LegacyOp::Eq => {
                    sql.push_str(" (Images.id IN    (SELECT imageid FROM ImageTags     WHERE tagid = ?)) ");
                    sql.bind(tag_id);
                }
                LegacyOp::Ne => {
                    sql.push_str(" (Images.id NOT IN    (SELECT imageid FROM ImageTags     WHERE tagid = ?)) ");
                    sql.bind(tag_id);
                }
                LegacyOp::Like => {
                    sql.push_str(" (Images.id IN ");
                    sql.push_str(LEGACY_TAG_TREE);
                    sql.bind(tag_id);
                    sql.bind(tag_id);
                }
                _ => {
                    sql.push_str(" (Images.id NOT IN ");
                    sql.push_str(LEGACY_TAG_TREE);
                    sql.bind(tag_id);
                    sql.bind(tag_id);
                }
            }
            return;
        }
        LegacyKey::Keyword => {
            warn!("Keyword rules cannot be compiled as a single column");
            sql.push_str(" 0 ");
            return;
        }
    };

    let closing = match key {
        LegacyKey::AlbumName | LegacyKey::AlbumCaption | LegacyKey::AlbumCollection => ")) ",
        LegacyKey::TagName => "))) ",
        _ => ") ",
    };

    sql.push_str(column);
    sql.push_str(op.to_sql());
    sql.push_str(" ?");
    sql.push_str(closing);
    sql.bind(pattern);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SqlParam;
    use crate::searchxml::{Element, SearchXmlReader};

    fn text(value: &str) -> SqlParam {
        SqlParam::Text(value.to_string())
    }

    #[test]
    fn test_parse_path_tokens() {
        let tokens = parse_path("1 AND ( 2 OR 3 ) foo 12a").unwrap();
        assert_eq!(
            tokens,
            vec![
                PathToken::Rule(1),
                PathToken::And,
                PathToken::Open,
                PathToken::Rule(2),
                PathToken::Or,
                PathToken::Rule(3),
                PathToken::Close,
                PathToken::Other("foo".to_string()),
                PathToken::Other("12a".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_path_connectors_need_separators() {
        let tokens = parse_path("ANDOR (1").unwrap();
        assert_eq!(
            tokens,
            vec![
                PathToken::Other("ANDOR".to_string()),
                PathToken::Other("(1".to_string()),
            ]
        );
        assert!(parse_path("   ").unwrap().is_empty());
    }

    #[test]
    fn test_convert_without_rules() {
        let builder = ImageQueryBuilder::new();
        assert_eq!(builder.convert_from_url_to_xml("digikamsearch:1?count=0").unwrap(), None);
        assert_eq!(builder.convert_from_url_to_xml("digikamsearch:1").unwrap(), None);
    }

    #[test]
    fn test_convert_invalid_url() {
        let builder = ImageQueryBuilder::new();
        assert!(matches!(
            builder.convert_from_url_to_xml("no scheme here"),
            Err(SearchError::Url(_))
        ));
    }

    #[test]
    fn test_convert_renames_keys_and_ops() {
        let builder = ImageQueryBuilder::new();
        let url = "digikamsearch:1 AND 2?1.key=ImageName&1.op=like&1.val=beach&2.key=tag&2.op=like&2.val=5&count=2";
        let xml = builder.convert_from_url_to_xml(url).unwrap().unwrap();

        assert!(xml.contains(r#"convertedFrom09Url="true""#));
        assert!(xml.contains(r#"<field name="filename" relation="like">beach</field>"#));
        assert!(xml.contains(r#"<field name="tagid" relation="intree">5</field>"#));
    }

    #[test]
    fn test_convert_or_starts_new_group() {
        let builder = ImageQueryBuilder::new();
        let url = "digikamsearch:1 OR 2?1.key=rating&1.op=gte&1.val=3&2.key=imagedate&2.op=lt&2.val=2005-01-01&count=2";
        let xml = builder.convert_from_url_to_xml(url).unwrap().unwrap();

        let mut reader = SearchXmlReader::new(&xml);
        assert_eq!(reader.read_next(), Element::Group);
        assert_eq!(reader.read_next(), Element::Field);
        assert_eq!(reader.field_name(), "rating");
        assert_eq!(reader.field_relation(), Relation::GreaterThanOrEqual);
        reader.value();
        assert_eq!(reader.read_next(), Element::GroupEnd);
        assert_eq!(reader.read_next(), Element::Group);
        assert_eq!(reader.group_operator(), Operator::Or);
        assert_eq!(reader.read_next(), Element::Field);
        assert_eq!(reader.field_name(), "creationdate");
        assert_eq!(reader.field_relation(), Relation::LessThan);
    }

    #[test]
    fn test_convert_parentheses_bind_tighter_than_and() {
        let builder = ImageQueryBuilder::new();
        let url = "digikamsearch:1 AND ( 2 OR 3 )?1.key=imagename&1.op=eq&1.val=a&2.key=imagename&2.op=eq&2.val=b&3.key=imagename&3.op=eq&3.val=c&count=3";
        let xml = builder.convert_from_url_to_xml(url).unwrap().unwrap();

        assert!(xml.contains(concat!(
            r#"<field name="filename" relation="equal">a</field>"#,
            r#"<group operator="and"><group><field name="filename" relation="equal">b</field></group>"#,
            r#"<group><field name="filename" relation="equal">c</field></group></group>"#
        )));

        let compiled = builder.build_query(url);
        assert_eq!(compiled.bound_values, vec![text("a"), text("b"), text("c")]);
        assert!(compiled.sql.contains("AND ( ("));
    }

    #[test]
    fn test_convert_skips_missing_rules_and_unbalanced_parens() {
        let builder = ImageQueryBuilder::new();
        let url = "digikamsearch:1 AND 7 ) ( 1?1.key=keyword&1.op=like&1.val=x&count=1";
        let xml = builder.convert_from_url_to_xml(url).unwrap().unwrap();

        let mut reader = SearchXmlReader::new(&xml);
        let mut fields = 0;
        while !reader.at_end() {
            if reader.read_next() == Element::Field {
                assert_eq!(reader.field_name(), "keyword");
                fields += 1;
            }
        }
        assert_eq!(fields, 2);
        assert!(reader.error().is_none());
    }

    #[test]
    fn test_build_query_routes_legacy_urls() {
        let builder = ImageQueryBuilder::new();
        let compiled = builder
            .build_query("digikamsearch:1?1.key=imagename&1.op=like&1.val=beach&count=1");

        assert!(compiled.sql.contains("Images.name LIKE ?"));
        assert_eq!(compiled.bound_values, vec![text("%beach%")]);
    }

    #[test]
    fn test_direct_compile_connectors() {
        let builder = ImageQueryBuilder::new();
        let compiled = builder
            .build_query_from_url("digikamsearch:1 OR 2?1.key=album&1.op=eq&1.val=3&2.key=rating&2.op=gte&2.val=4&count=2")
            .unwrap();

        assert_eq!(
            compiled.sql,
            " (Images.dirid = ?)  OR  (ImageProperties.value >= ? and ImageProperties.property='Rating') "
        );
        assert_eq!(compiled.bound_values, vec![text("3"), text("4")]);
        assert!(compiled.hooks.is_empty());
    }

    #[test]
    fn test_direct_compile_exact_date() {
        let builder = ImageQueryBuilder::new();
        let compiled = builder
            .build_query_from_url("digikamsearch:1?1.key=imagedate&1.op=eq&1.val=2005-03-10&count=1")
            .unwrap();

        assert_eq!(compiled.sql, " (Images.datetime > ? AND Images.datetime < ?) ");
        assert_eq!(compiled.bound_values, vec![text("2005-03-09"), text("2005-03-11")]);
    }

    #[test]
    fn test_direct_compile_keyword_dates() {
        let builder = ImageQueryBuilder::new();

        let year = builder
            .build_query_from_url("digikamsearch:1?1.key=keyword&1.op=like&1.val=2005&count=1")
            .unwrap();
        assert_eq!(year.sql, " (Images.datetime LIKE ?) ");
        assert_eq!(year.bound_values, vec![text("%2005-%-%%")]);

        let month = builder
            .build_query_from_url("digikamsearch:1?1.key=keyword&1.op=like&1.val=March&count=1")
            .unwrap();
        assert_eq!(month.bound_values, vec![text("%%-03-%%")]);

        let day = builder
            .build_query_from_url("digikamsearch:1?1.key=keyword&1.op=like&1.val=2010-12-24&count=1")
            .unwrap();
        assert_eq!(day.bound_values, vec![text("2010-12-23"), text("2010-12-25")]);
    }

    #[test]
    fn test_direct_compile_keyword_text() {
        let builder = ImageQueryBuilder::new();
        let compiled = builder
            .build_query_from_url("digikamsearch:1?1.key=keyword&1.op=like&1.val=beach&count=1")
            .unwrap();

        assert!(compiled.sql.starts_with("( (Images.dirid IN"));
        assert!(compiled.sql.ends_with(")"));
        assert_eq!(compiled.sql.matches(" OR ").count(), 6);
        assert_eq!(compiled.bound_values.len(), 7);
        assert!(compiled.bound_values.iter().all(|v| *v == text("%beach%")));
    }

    #[test]
    fn test_direct_compile_tag_tree_binds_ids() {
        let builder = ImageQueryBuilder::new();
        let compiled = builder
            .build_query_from_url("digikamsearch:1?1.key=tag&1.op=like&1.val=5&count=1")
            .unwrap();

        assert!(compiled.sql.starts_with(" (Images.id IN "));
        assert_eq!(compiled.bound_values, vec![SqlParam::Integer(5), SqlParam::Integer(5)]);
    }

    #[test]
    fn test_direct_compile_skips_unknown_rules() {
        let builder = ImageQueryBuilder::new();
        let compiled = builder
            .build_query_from_url("digikamsearch:1 AND 2 AND 3?1.key=color&1.op=eq&1.val=red&2.key=rating&2.op=about&2.val=1&3.key=imagecaption&3.op=nlike&3.val=x&count=3")
            .unwrap();

        assert_eq!(compiled.sql, " 0  AND  0  AND  (Images.caption NOT LIKE ?) ");
        assert_eq!(compiled.bound_values, vec![text("%x%")]);
    }

    #[test]
    fn test_possible_date() {
        let builder = ImageQueryBuilder::new();
        assert_eq!(
            builder.possible_date("2001-02-03"),
            Some(("2001-02-03".to_string(), true))
        );
        assert_eq!(builder.possible_date("1999"), Some(("1999-%-%".to_string(), false)));
        assert_eq!(builder.possible_date("1969"), None);
        assert_eq!(builder.possible_date("99999"), None);
        assert_eq!(builder.possible_date("dec"), Some(("%-12-%".to_string(), false)));
        assert_eq!(builder.possible_date("beach"), None);
    }
}
