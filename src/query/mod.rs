//! Query module - compiles searches to SQL.
//!
//! A search document is turned into a parenthesized WHERE fragment with
//! `?` placeholders, the values to bind to them in order, and the
//! post-filter hooks that must run on the result rows.
//!
//! Unknown or malformed fields never abort compilation. They are replaced
//! by a constant (`1` or `0`) that leaves the surrounding expression
//! unchanged, so a search written by a newer version still runs.

mod buffer;
mod custom;
mod field_builder;
mod fields;
mod hooks;
pub mod legacy;
mod position;

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

pub use buffer::{bound_value_placeholders, SqlBuffer, SqlParam};
pub use fields::{CustomField, FieldEncoding, FieldRegistry, NO_EFFECT_PREFIX};
pub use hooks::{HaversinePostHook, PostHook, PostHooks};
pub use position::{GeoRect, DEFAULT_NEAR_DISTANCE};

use crate::config::BuilderConfig;
use crate::geodetic::Ellipsoid;
use crate::searchxml::{Element, Operator, Relation, SearchXmlCachingReader};
use field_builder::FieldQueryBuilder;

/// Prefix of searches stored in the legacy URL format.
pub const LEGACY_URL_SCHEME: &str = "digikamsearch:";

/// Groups nested deeper than this are ignored.
pub const MAX_GROUP_DEPTH: usize = 64;

/// Album lookups needed to compile album subtree searches.
pub trait AlbumInfoProvider {
    /// Album root id and path relative to that root, `None` for unknown albums.
    fn album_location(&self, album_id: i32) -> Option<(i32, String)>;
}

/// Provider that knows no albums.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAlbumInfo;

impl AlbumInfoProvider for NoAlbumInfo {
    fn album_location(&self, _album_id: i32) -> Option<(i32, String)> {
        None
    }
}

/// Output of a compilation.
#[derive(Debug, Default, Serialize)]
pub struct CompiledQuery {
    /// Boolean SQL expression for a WHERE clause; empty if nothing was compiled
    pub sql: String,
    /// One value per `?` in `sql`, in order
    pub bound_values: Vec<SqlParam>,
    /// Row filters to apply after the query ran
    #[serde(skip)]
    pub hooks: PostHooks,
}

impl CompiledQuery {
    fn new(sql: SqlBuffer, hooks: PostHooks) -> Self {
        let (sql, bound_values) = sql.into_parts();
        Self {
            sql,
            bound_values,
            hooks,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sql.trim().is_empty()
    }
}

/// Compiles searches against the item database.
///
/// Holds only read-only state; one builder can serve any number of
/// compilations, also from several threads.
#[derive(Debug, Clone)]
pub struct ImageQueryBuilder {
    config: Arc<BuilderConfig>,
    registry: Arc<FieldRegistry>,
    ellipsoid: Ellipsoid,
    image_tag_properties_joined: bool,
}

impl Default for ImageQueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageQueryBuilder {
    pub fn new() -> Self {
        Self::with_config(Arc::new(BuilderConfig::default()))
    }

    pub fn with_config(config: Arc<BuilderConfig>) -> Self {
        Self {
            ellipsoid: config.ellipsoid.ellipsoid(),
            image_tag_properties_joined: config.image_tag_properties_joined,
            registry: Arc::new(FieldRegistry::standard()),
            config,
        }
    }

    /// Replace the field table.
    pub fn with_registry(mut self, registry: Arc<FieldRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Compile tag properties against an `ImageTagProperties` table joined
    /// into the outer query.
    pub fn set_image_tag_properties_joined(&mut self, joined: bool) {
        self.image_tag_properties_joined = joined;
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn ellipsoid(&self) -> &Ellipsoid {
        &self.ellipsoid
    }

    /// Compile a serialized search or a legacy search URL.
    pub fn build_query(&self, query: &str) -> CompiledQuery {
        self.build_query_with(query, &NoAlbumInfo)
    }

    /// Like [`build_query`](Self::build_query), resolving albums through `albums`.
    pub fn build_query_with(&self, query: &str, albums: &dyn AlbumInfoProvider) -> CompiledQuery {
        if !query.starts_with(LEGACY_URL_SCHEME) {
            return self.build_query_from_xml(query, albums);
        }

        match self.convert_from_url_to_xml(query) {
            Ok(Some(xml)) => self.build_query_from_xml(&xml, albums),
            Ok(None) => {
                debug!("Legacy search without rules");
                CompiledQuery::default()
            }
            Err(e) => {
                warn!("Failed to convert legacy search: {}", e);
                CompiledQuery::default()
            }
        }
    }

    /// Compile a serialized search document.
    pub fn build_query_from_xml(&self, xml: &str, albums: &dyn AlbumInfoProvider) -> CompiledQuery {
        let mut compilation = Compilation {
            builder: self,
            albums,
            reader: SearchXmlCachingReader::new(xml),
            hooks: PostHooks::new(),
        };

        let mut sql = SqlBuffer::new();
        let mut first_group = true;

        while !compilation.reader.at_end() {
            if compilation.reader.read_next() == Element::Group {
                sql.add_operator(compilation.reader.group_operator(), first_group);
                first_group = false;
                compilation.build_group(&mut sql, 1);
            }
        }

        if let Some(error) = compilation.reader.error() {
            warn!("Search document ended early: {}", error);
        }

        debug!("Compiled search: {}", sql.sql());
        CompiledQuery::new(sql, compilation.hooks)
    }
}

fn add_empty_group(sql: &mut SqlBuffer, group_operator: Operator) {
    sql.push_str(" (");
    sql.add_no_effect_content(group_operator);
    sql.push_str(") ");
}

/// State of one compilation.
pub(crate) struct Compilation<'q, 'x> {
    builder: &'q ImageQueryBuilder,
    albums: &'q dyn AlbumInfoProvider,
    reader: SearchXmlCachingReader<'x>,
    hooks: PostHooks,
}

impl Compilation<'_, '_> {
    /// Compile the group the reader is positioned on, up to its end.
    ///
    /// Returns whether any field of the group (or of its subgroups) was
    /// compiled. A group without such content collapses to the no-effect
    /// constant of its own operator.
    fn build_group(&mut self, sql: &mut SqlBuffer, depth: usize) -> bool {
        let group_operator = self.reader.group_operator();

        if depth > MAX_GROUP_DEPTH {
            warn!("Search groups nested deeper than {} are ignored", MAX_GROUP_DEPTH);
            self.reader.read_to_end_of_element();
            add_empty_group(sql, group_operator);
            return false;
        }

        let mut group = SqlBuffer::new();
        group.push_str(" (");

        let mut first = true;
        let mut has_content = false;

        while !self.reader.at_end() {
            match self.reader.read_next() {
                Element::Group => {
                    group.add_operator(self.reader.group_operator(), first);
                    first = false;
                    has_content |= self.build_group(&mut group, depth + 1);
                }
                Element::Field => {
                    let field_operator = self.reader.field_operator();
                    let name = self.reader.field_name().to_string();
                    let relation = self.reader.field_relation();

                    group.add_operator(field_operator, first);
                    first = false;

                    let mut fragment = SqlBuffer::new();
                    if self.build_field(&mut fragment, &name, relation) {
                        group.append(fragment);
                        has_content = true;
                    } else {
                        group.add_no_effect_content(field_operator);
                    }

                    if self.reader.is_unconsumed_field() {
                        self.reader.read_to_end_of_element();
                    }
                }
                Element::GroupEnd | Element::End => break,
                Element::Search | Element::FieldEnd => {}
            }
        }

        if has_content {
            group.push_str(") ");
            sql.append(group);
        } else {
            add_empty_group(sql, group_operator);
        }
        has_content
    }

    /// Compile one field into `sql`. `false` if the field was declined.
    fn build_field(&mut self, sql: &mut SqlBuffer, name: &str, relation: Relation) -> bool {
        if name.starts_with(NO_EFFECT_PREFIX) {
            return false;
        }

        let Some(encoding) = self.builder.registry.lookup(name) else {
            debug!("Search field '{}' is not known", name);
            return false;
        };

        if let FieldEncoding::Custom(custom) = encoding {
            return self.build_custom_field(sql, custom, relation);
        }

        let mut field = FieldQueryBuilder::new(sql, &mut self.reader, relation);
        match encoding {
            FieldEncoding::Int(column) => field.add_int_field(column),
            FieldEncoding::Double(column) => field.add_double_field(column),
            FieldEncoding::String(column) => field.add_string_field(column),
            FieldEncoding::Date(column) => field.add_date_field(column),
            FieldEncoding::ChoiceInt(column) => field.add_choice_int_field(column),
            FieldEncoding::ChoiceString(column) => field.add_choice_string_field(column),
            FieldEncoding::IntBitmask(column) => field.add_int_bitmask_field(column),
            FieldEncoding::LongList(column) => field.add_long_list_field(column),
            FieldEncoding::Position => field.add_position(&mut self.hooks, &self.builder.ellipsoid),
            FieldEncoding::Custom(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::searchxml::{KeywordSearchWriter, SearchXmlWriter};

    fn compile(xml: &str) -> CompiledQuery {
        ImageQueryBuilder::new().build_query(xml)
    }

    fn text(value: &str) -> SqlParam {
        SqlParam::Text(value.to_string())
    }

    fn assert_aligned(query: &CompiledQuery) {
        assert_eq!(
            query.sql.matches('?').count(),
            query.bound_values.len(),
            "placeholders and values differ in {}",
            query.sql
        );
    }

    struct Albums;

    impl AlbumInfoProvider for Albums {
        fn album_location(&self, album_id: i32) -> Option<(i32, String)> {
            match album_id {
                1 => Some((1, "/".to_string())),
                2 => Some((1, "/Holidays".to_string())),
                _ => None,
            }
        }
    }

    #[test]
    fn test_rating_greater_than() {
        let query = compile(
            r#"<search><group><field name="rating" relation="greaterthan">3</field></group></search>"#,
        );
        assert!(query.sql.contains("(ImageInformation.rating > ?)"));
        assert_eq!(query.bound_values, vec![SqlParam::Integer(3)]);
        assert!(query.hooks.is_empty());
    }

    #[test]
    fn test_fields_combined_with_operators() {
        let mut writer = SearchXmlWriter::new();
        writer.write_group();
        writer.write_field("rating", Relation::GreaterThanOrEqual);
        writer.write_int(2);
        writer.finish_field();
        writer.write_field("filename", Relation::Like);
        writer.set_field_operator(Operator::AndNot);
        writer.write_value("tmp");
        writer.finish_field();
        writer.finish_group();
        writer.finish();

        let query = compile(&writer.xml());
        assert_eq!(
            query.sql,
            " ( (ImageInformation.rating >= ?) AND NOT (Images.name LIKE ?) ) "
        );
        assert_eq!(
            query.bound_values,
            vec![SqlParam::Integer(2), text("%tmp%")]
        );
    }

    #[test]
    fn test_unknown_field_gets_no_effect_content() {
        let query = compile(
            r#"<search><group><field name="rating" relation="equal">5</field><field name="futurefield" relation="equal" operator="and">x</field><field name="filesize" relation="lessthan" operator="andnot">10</field></group></search>"#,
        );
        assert_eq!(
            query.sql,
            " ( (ImageInformation.rating = ?) AND 1 AND NOT (Images.fileSize < ?) ) "
        );
        assert_eq!(
            query.bound_values,
            vec![SqlParam::Integer(5), SqlParam::Integer(10)]
        );
    }

    #[test]
    fn test_declined_not_field_is_contradiction() {
        let query = compile(
            r#"<search><group><field name="rating" relation="equal">5</field><field name="noeffect_hint" relation="equal" operator="ornot">x</field></group></search>"#,
        );
        assert_eq!(query.sql, " ( (ImageInformation.rating = ?) OR NOT 0 ) ");
    }

    #[test]
    fn test_declined_field_leaves_no_partial_sql() {
        let query = compile(
            r#"<search><group><field name="filesize" relation="interval"><listitem>1</listitem></field></group></search>"#,
        );
        assert_eq!(query.sql, " ( 1 ) ");
        assert!(query.bound_values.is_empty());
    }

    #[test]
    fn test_empty_group_under_and() {
        let query = compile(
            r#"<search><group><field name="rating" relation="equal">1</field><group operator="and"></group></group></search>"#,
        );
        assert_eq!(query.sql, " ( (ImageInformation.rating = ?) AND ( 1 ) ) ");
    }

    #[test]
    fn test_declined_group_under_andnot_is_neutral() {
        let query = compile(
            r#"<search><group><field name="rating" relation="equal">1</field><group operator="andnot"><field name="nosuchfield">1</field></group></group></search>"#,
        );
        assert_eq!(
            query.sql,
            " ( (ImageInformation.rating = ?) AND NOT ( 0 ) ) "
        );
    }

    #[test]
    fn test_fully_empty_group_uses_group_operator() {
        let query = compile(r#"<search><group operator="ornot"></group></search>"#);
        assert_eq!(query.sql, "NOT ( 0 ) ");
    }

    #[test]
    fn test_top_level_groups() {
        let query = compile(
            r#"<search><group><field name="rating" relation="equal">1</field></group><group operator="and"><field name="rating" relation="equal">2</field></group></search>"#,
        );
        assert_eq!(
            query.sql,
            " ( (ImageInformation.rating = ?) ) AND ( (ImageInformation.rating = ?) ) "
        );
    }

    #[test]
    fn test_nested_groups_keep_order() {
        let query = compile(
            r#"<search><group><field name="rating" relation="equal">1</field><group operator="or"><field name="filesize" relation="equal">2</field><field name="colordepth" relation="equal" operator="or">3</field></group><field name="colormodel" relation="equal">4</field></group></search>"#,
        );
        assert_eq!(
            query.sql,
            " ( (ImageInformation.rating = ?) OR ( (Images.fileSize = ?) OR (ImageInformation.colorDepth = ?) ) AND (ImageInformation.colorModel = ?) ) "
        );
        assert_eq!(
            query.bound_values,
            vec![
                SqlParam::Integer(1),
                SqlParam::Integer(2),
                SqlParam::Integer(3),
                SqlParam::Integer(4)
            ]
        );
    }

    #[test]
    fn test_deep_nesting_is_bounded() {
        let depth = MAX_GROUP_DEPTH + 10;
        let xml = format!(
            "<search>{}<field name=\"rating\">1</field>{}</search>",
            "<group>".repeat(depth),
            "</group>".repeat(depth)
        );
        let query = compile(&xml);
        assert!(!query.sql.contains("rating"));
        assert_aligned(&query);
    }

    #[test]
    fn test_keyword_expands_to_text_fields() {
        let xml = KeywordSearchWriter::new().xml(&["beach"]);
        let query = compile(&xml);

        assert!(query
            .sql
            .contains("(Albums.relativePath LIKE ?) OR (Images.name LIKE ?)"));
        assert!(query.sql.contains("WHERE type=? AND comment LIKE ?"));
        assert_eq!(query.bound_values.len(), 9);
        assert_eq!(query.bound_values[0], text("%beach%"));
        assert_eq!(query.bound_values[2], text("%beach%"));
        assert_aligned(&query);
    }

    #[test]
    fn test_tag_relations() {
        let equal = compile(
            r#"<search><group><field name="tagid" relation="equal">5</field></group></search>"#,
        );
        assert!(equal.sql.contains("(SELECT imageid FROM ImageTags WHERE tagid = ?)"));

        let tree = compile(
            r#"<search><group><field name="tagid" relation="notintree"><listitem>5</listitem><listitem>6</listitem></field></group></search>"#,
        );
        assert!(tree.sql.contains("(Images.id NOT IN (SELECT ImageTags.imageid"));
        assert!(tree.sql.contains("OR (TagsTree.pid = ? OR ImageTags.tagid = ? )"));
        assert_eq!(tree.bound_values.len(), 4);

        let all_of = compile(
            r#"<search><group><field name="tagid" relation="allof"><listitem>5</listitem><listitem>6</listitem></field></group></search>"#,
        );
        assert!(all_of.sql.starts_with(" ( ( (Images.id IN"));
        assert!(all_of.sql.contains(")) AND (Images.id IN"));
        assert_aligned(&all_of);
    }

    #[test]
    fn test_tag_one_of_with_untagged() {
        let query = compile(
            r#"<search><group><field name="tagid" relation="oneof"><listitem>5</listitem><listitem>-1</listitem></field></group></search>"#,
        );
        assert_eq!(
            query.sql,
            " ( (Images.id IN (SELECT imageid FROM ImageTags WHERE tagid IN (?)) OR Images.id NOT IN (SELECT imageid FROM ImageTags)) ) "
        );
        assert_eq!(query.bound_values, vec![SqlParam::Integer(5)]);
    }

    #[test]
    fn test_album_tree_uses_provider() {
        let xml = r#"<search><group><field name="albumid" relation="intree"><listitem>1</listitem><listitem>2</listitem><listitem>99</listitem></field></group></search>"#;
        let query = ImageQueryBuilder::new().build_query_with(xml, &Albums);

        assert!(query.sql.contains("(Images.album IN (SELECT DISTINCT id FROM Albums WHERE"));
        assert_eq!(
            query.bound_values,
            vec![
                SqlParam::Integer(1),
                text("/"),
                text("/%"),
                SqlParam::Integer(1),
                text("/Holidays"),
                text("/Holidays/%"),
            ]
        );
        assert_aligned(&query);

        let unknown = ImageQueryBuilder::new().build_query(xml);
        assert_eq!(unknown.sql, " ( 1 ) ");
    }

    #[test]
    fn test_width_respects_orientation() {
        let query = compile(
            r#"<search><group><field name="width" relation="greaterthan">1000</field></group></search>"#,
        );
        assert_eq!(
            query.sql,
            " ( ( (ImageInformation.orientation <= ? AND  (ImageInformation.width > ?) ) OR (ImageInformation.orientation >= ? AND  (ImageInformation.height > ?)  ) ) ) "
        );
        assert_eq!(
            query.bound_values,
            vec![
                SqlParam::Integer(4),
                SqlParam::Integer(1000),
                SqlParam::Integer(5),
                SqlParam::Integer(1000)
            ]
        );
    }

    #[test]
    fn test_page_orientation() {
        let landscape = compile(
            r#"<search><group><field name="pageorientation" relation="equal">1</field></group></search>"#,
        );
        assert_eq!(
            landscape.bound_values,
            vec![SqlParam::Integer(4), SqlParam::Integer(5)]
        );

        let invalid = compile(
            r#"<search><group><field name="pageorientation" relation="equal">9</field></group></search>"#,
        );
        assert_eq!(invalid.sql, " ( 1 ) ");
    }

    #[test]
    fn test_video_fields() {
        let duration = compile(
            r#"<search><group><field name="videoduration" relation="interval"><listitem>10</listitem><listitem>60</listitem></field></group></search>"#,
        );
        assert!(duration.sql.contains(
            "(CAST(VideoMetadata.duration AS INTEGER) >= ? AND CAST(VideoMetadata.duration AS INTEGER) <= ?)"
        ));
        assert_eq!(
            duration.bound_values,
            vec![SqlParam::Integer(10_000), SqlParam::Integer(60_000)]
        );

        let channels = compile(
            r#"<search><group><field name="rating" relation="equal">1</field><field name="videoaudiochanneltype" relation="oneof"><listitem>2</listitem><listitem>6</listitem></field></group></search>"#,
        );
        assert!(channels.sql.contains("(VideoMetadata.audioChannelType IN (?,?,?))"));
        assert_eq!(
            &channels.bound_values[1..],
            &[text("2"), text("Stereo"), text("6")]
        );

        let codec = compile(
            r#"<search><group><field name="videocodec" relation="oneof"><listitem>h264</listitem><listitem>vp9</listitem></field></group></search>"#,
        );
        assert!(codec.sql.contains(
            "(Upper(VideoMetadata.videoCodec) LIKE ? OR Upper(VideoMetadata.videoCodec) LIKE ?)"
        ));
        assert_eq!(codec.bound_values, vec![text("%H264%"), text("%VP9%")]);

        let ratio = compile(
            r#"<search><group><field name="videoaspectratio" relation="equal">16:9</field></group></search>"#,
        );
        assert!(ratio.sql.contains(
            "(VideoMetadata.aspectRatio IN (?) OR abs(CAST(VideoMetadata.aspectRatio as REAL) - ?) < 0.1)"
        ));
        assert_aligned(&ratio);
    }

    #[test]
    fn test_comments_and_creator() {
        let title = compile(
            r#"<search><group><field name="title" relation="like">sunset</field></group></search>"#,
        );
        assert!(title.sql.contains(
            "(Images.id IN (SELECT imageid FROM ImageComments WHERE type=? AND comment LIKE ?))"
        ));
        assert_eq!(
            title.bound_values,
            vec![SqlParam::Integer(4), text("%sunset%")]
        );

        let creator = compile(
            r#"<search><group><field name="creator" relation="equal">Ansel</field></group></search>"#,
        );
        assert!(creator.sql.contains("property='creator' and value = ?"));
        assert_eq!(creator.bound_values, vec![text("Ansel")]);
    }

    #[test]
    fn test_image_tag_property() {
        let xml = r#"<search><group><field name="imagetagproperty" relation="intree" tagid="7"><listitem>faceRegion</listitem><listitem>x</listitem></field></group></search>"#;

        let subquery = compile(xml);
        assert!(subquery.sql.contains(
            "(Images.id IN (SELECT imageid FROM ImageTagProperties WHERE (tagid=? OR tagid IN (SELECT id FROM TagsTree WHERE pid=?)) AND property=? AND value = ?  ))"
        ));
        assert_eq!(
            subquery.bound_values,
            vec![
                SqlParam::Integer(7),
                SqlParam::Integer(7),
                text("faceRegion"),
                text("x")
            ]
        );

        let mut builder = ImageQueryBuilder::new();
        builder.set_image_tag_properties_joined(true);
        let joined = builder.build_query(
            r#"<search><group><field name="imagetagproperty" relation="equal">faceRegion</field></group></search>"#,
        );
        assert_eq!(joined.sql, " ( ( ImageTagProperties.property=?  ) ) ");
    }

    #[test]
    fn test_similarity_and_constant_fields() {
        let similarity = compile(
            r#"<search><group><field name="similarity" relation="equal">1</field></group></search>"#,
        );
        assert_eq!(similarity.sql, " ( 1 ) ");

        let no_gps = compile(
            r#"<search><group><field name="nogps" relation="equal"/><field name="notag" relation="equal"/></group></search>"#,
        );
        assert!(no_gps.sql.contains("ImagePositions.latitudeNumber IS NULL"));
        assert!(no_gps.sql.contains("AND (Images.id NOT IN (SELECT imageid FROM ImageTags))"));
        assert!(no_gps.bound_values.is_empty());
    }

    #[test]
    fn test_near_field_registers_hook() {
        let query = compile(
            r#"<search><group><field name="position" relation="near" type="radius" distance="100"><listitem>8.5</listitem><listitem>47.3</listitem></field></group></search>"#,
        );
        assert_eq!(query.hooks.len(), 1);
        assert!(query.hooks.check_position(47.3, 8.5));
        assert_aligned(&query);
    }

    #[test]
    fn test_two_near_fields_have_independent_hooks() {
        let query = compile(
            r#"<search><group><field name="position" relation="near" distance="1000"><listitem>0</listitem><listitem>0</listitem></field><field name="position" relation="near" distance="1000" operator="or"><listitem>10</listitem><listitem>10</listitem></field></group></search>"#,
        );
        assert_eq!(query.hooks.len(), 2);
        assert!(!query.hooks.check_position(0.0, 0.0));
    }

    #[test]
    fn test_malformed_document_still_compiles() {
        let query = compile(
            r#"<search><group><field name="rating" relation="equal">1</field><group>"#,
        );
        assert_aligned(&query);
        assert!(query.sql.contains("(ImageInformation.rating = ?)"));
    }

    #[test]
    fn test_custom_registry() {
        let mut registry = FieldRegistry::empty();
        registry.register("stars", FieldEncoding::Int("Custom.stars"));
        let builder = ImageQueryBuilder::new().with_registry(Arc::new(registry));

        let query = builder.build_query(
            r#"<search><group><field name="stars" relation="lessthan">2</field><field name="rating" relation="equal">1</field></group></search>"#,
        );
        assert_eq!(query.sql, " ( (Custom.stars < ?) AND 1 ) ");
    }

    #[test]
    fn test_serializes_to_json() {
        let query = compile(
            r#"<search><group><field name="filename" relation="like">a</field></group></search>"#,
        );
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["bound_values"][0], "%a%");
        assert!(json.get("hooks").is_none());
    }
}
