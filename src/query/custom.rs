//! Fields with hand written SQL.

use tracing::{debug, warn};

use super::buffer::SqlBuffer;
use super::field_builder::{prepare_for_like, FieldQueryBuilder};
use super::fields::CustomField;
use super::Compilation;
use crate::searchxml::{Operator, Relation};

/// Exif orientation "flipped vertically"; all larger values swap width and height.
const ORIENTATION_VFLIP: i32 = 4;
/// Exif orientation "rotated 90° and flipped horizontally".
const ORIENTATION_ROT_90_HFLIP: i32 = 5;

/// Comment types of `ImageComments.type`.
const COMMENT_TYPE_COMMENT: i32 = 1;
const COMMENT_TYPE_HEADLINE: i32 = 2;
const COMMENT_TYPE_TITLE: i32 = 4;

/// Fields a keyword is matched against.
const KEYWORD_DELEGATES: [&str; 7] = [
    "albumname",
    "filename",
    "tagname",
    "albumcaption",
    "albumcollection",
    "comment",
    "title",
];

const ASPECT_RATIO_TOLERANCE: &str = "0.1";

const TAG_EQUAL: &str = " (Images.id IN \
    (SELECT imageid FROM ImageTags \
     WHERE tagid = ?)) ";

const TAG_UNEQUAL: &str = " (Images.id NOT IN \
    (SELECT imageid FROM ImageTags \
     WHERE tagid = ?)) ";

const TAG_TREE_JOIN: &str = "(SELECT ImageTags.imageid FROM ImageTags \
    INNER JOIN TagsTree ON ImageTags.tagid = TagsTree.id \
    WHERE ";

const TAG_NAME_SUBQUERY: &str = "(SELECT imageid FROM ImageTags \
    WHERE tagid IN \
    (SELECT id FROM Tags WHERE name LIKE ?))) ";

const TAG_NAME_TREE_SUBQUERY: &str = "(SELECT ImageTags.imageid FROM ImageTags \
    INNER JOIN TagsTree ON ImageTags.tagid = TagsTree.id \
    WHERE TagsTree.pid = (SELECT id FROM Tags WHERE name LIKE ?) \
    or ImageTags.tagid = (SELECT id FROM Tags WHERE name LIKE ?) )) ";

impl Compilation<'_, '_> {
    pub(super) fn build_custom_field(
        &mut self,
        sql: &mut SqlBuffer,
        field: CustomField,
        relation: Relation,
    ) -> bool {
        match field {
            CustomField::AlbumId => self.add_album_id(sql, relation),
            CustomField::TagId => self.add_tag_id(sql, relation),
            CustomField::TagName => self.add_tag_name(sql, relation),
            CustomField::NoTag => {
                self.reader.read_to_end_of_element();
                sql.push_str(" (Images.id NOT IN (SELECT imageid FROM ImageTags)) ");
                true
            }
            CustomField::NoGps => {
                self.reader.read_to_end_of_element();
                sql.push_str(
                    " (ImagePositions.latitudeNumber IS NULL \
                     AND ImagePositions.longitudeNumber IS NULL) ",
                );
                true
            }
            CustomField::PageOrientation => self.add_page_orientation(sql, relation),
            CustomField::Width => self.add_oriented_size(
                sql,
                relation,
                "ImageInformation.width",
                "ImageInformation.height",
            ),
            CustomField::Height => self.add_oriented_size(
                sql,
                relation,
                "ImageInformation.height",
                "ImageInformation.width",
            ),
            CustomField::AspectRatioImg => self.add_image_aspect_ratio(sql),
            CustomField::VideoAspectRatio => self.add_video_aspect_ratio(sql, relation),
            CustomField::VideoAudioBitrate => {
                let values = self.reader.value_to_int_list();
                self.add_cast_interval(sql, relation, "CAST(VideoMetadata.audioBitRate AS INTEGER)", values)
            }
            CustomField::VideoDuration => {
                // stored in milliseconds
                let values: Vec<i64> = self
                    .reader
                    .value_to_int_list()
                    .into_iter()
                    .map(|seconds| seconds as i64 * 1000)
                    .collect();
                self.add_cast_interval(sql, relation, "CAST(VideoMetadata.duration AS INTEGER)", values)
            }
            CustomField::VideoFrameRate => {
                let values = self.reader.value_to_double_list();
                self.add_cast_interval(sql, relation, "CAST(VideoMetadata.frameRate AS REAL)", values)
            }
            CustomField::VideoAudioChannelType => self.add_audio_channel_type(sql, relation),
            CustomField::VideoCodec => self.add_video_codec(sql, relation),
            CustomField::Comment => self.add_comment(sql, relation, COMMENT_TYPE_COMMENT, "comment"),
            CustomField::CommentAuthor => {
                self.add_comment(sql, relation, COMMENT_TYPE_COMMENT, "author")
            }
            CustomField::Headline => {
                self.add_comment(sql, relation, COMMENT_TYPE_HEADLINE, "comment")
            }
            CustomField::Title => self.add_comment(sql, relation, COMMENT_TYPE_TITLE, "comment"),
            CustomField::Creator => {
                let value = prepare_for_like(relation, &self.reader.value());
                sql.push_str(
                    " (Images.id IN (SELECT imageid FROM ImageCopyright \
                     WHERE property='creator' and value ",
                );
                sql.add_relation(relation);
                sql.push_str(" ?)) ");
                sql.bind(value);
                true
            }
            CustomField::ImageTagProperty => self.add_image_tag_property(sql, relation),
            CustomField::Keyword => self.add_keyword(sql, relation),
            CustomField::Similarity => {
                warn!("Search field 'similarity' is not supported by the query builder");
                false
            }
        }
    }

    fn add_album_id(&mut self, sql: &mut SqlBuffer, relation: Relation) -> bool {
        match relation {
            Relation::Equal | Relation::Unequal => {
                FieldQueryBuilder::new(sql, &mut self.reader, relation).add_int_field("Images.album")
            }
            Relation::OneOf => FieldQueryBuilder::new(sql, &mut self.reader, relation)
                .add_choice_int_field("Images.album"),
            Relation::InTree => {
                let ids = self.reader.value_to_int_or_int_list();
                if ids.is_empty() {
                    debug!("Relation 'InTree', name 'albumid': No values given");
                    return false;
                }

                let locations: Vec<(i32, String)> = ids
                    .into_iter()
                    .filter_map(|id| {
                        let location = self.albums.album_location(id);
                        if location.is_none() {
                            warn!("Album {} is unknown", id);
                        }
                        location
                    })
                    .collect();
                if locations.is_empty() {
                    return false;
                }

                sql.push_str("(Images.album IN (SELECT DISTINCT id FROM Albums WHERE ");
                for (index, (root_id, relative_path)) in locations.into_iter().enumerate() {
                    sql.add_operator(Operator::Or, index == 0);
                    let children = if relative_path == "/" {
                        "/%".to_string()
                    } else {
                        format!("{}/%", relative_path)
                    };
                    sql.push_str(" ( albumRoot=? AND (relativePath=? OR relativePath LIKE ?) ) ");
                    sql.bind(root_id);
                    sql.bind(relative_path);
                    sql.bind(children);
                }
                sql.push_str(" ))");
                true
            }
            other => {
                debug!("Relation {} is not supported for albumid", other.as_str());
                false
            }
        }
    }

    fn add_tag_id(&mut self, sql: &mut SqlBuffer, relation: Relation) -> bool {
        match relation {
            Relation::Equal | Relation::Unequal => {
                let tag_id = self.reader.value_to_int();
                sql.push_str(if relation == Relation::Equal {
                    TAG_EQUAL
                } else {
                    TAG_UNEQUAL
                });
                sql.bind(tag_id);
                true
            }
            Relation::InTree | Relation::NotInTree => {
                let ids = self.reader.value_to_int_or_int_list();
                if ids.is_empty() {
                    debug!("Relation '{}', name 'tagid': No values given", relation.as_str());
                    return false;
                }

                sql.push_str(if relation == Relation::InTree {
                    " (Images.id IN "
                } else {
                    " (Images.id NOT IN "
                });
                sql.push_str(TAG_TREE_JOIN);
                for (index, tag_id) in ids.into_iter().enumerate() {
                    sql.add_operator(Operator::Or, index == 0);
                    sql.push_str(" (TagsTree.pid = ? OR ImageTags.tagid = ? ) ");
                    sql.bind(tag_id);
                    sql.bind(tag_id);
                }
                sql.push_str(" )) ");
                true
            }
            Relation::OneOf => {
                let mut ids = self.reader.value_to_int_list();
                let search_for_untagged = ids.contains(&-1);
                ids.retain(|id| *id != -1);

                let mut terms = Vec::new();
                if !ids.is_empty() {
                    terms.push(format!(
                        "Images.id IN (SELECT imageid FROM ImageTags WHERE tagid IN ({}))",
                        super::buffer::bound_value_placeholders(ids.len())
                    ));
                }
                if search_for_untagged {
                    terms.push("Images.id NOT IN (SELECT imageid FROM ImageTags)".to_string());
                }
                if terms.is_empty() {
                    debug!("List for OneOf is empty");
                    return false;
                }

                sql.push_str(&format!(" ({}) ", terms.join(" OR ")));
                for tag_id in ids {
                    sql.bind(tag_id);
                }
                true
            }
            Relation::AllOf => {
                let ids = self.reader.value_to_int_or_int_list();
                if ids.is_empty() {
                    debug!("Relation 'AllOf', name 'tagid': No values given");
                    return false;
                }

                sql.push_str(" (");
                for (index, tag_id) in ids.into_iter().enumerate() {
                    sql.add_operator(Operator::And, index == 0);
                    sql.push_str(TAG_EQUAL);
                    sql.bind(tag_id);
                }
                sql.push_str(") ");
                true
            }
            other => {
                debug!("Relation {} is not supported for tagid", other.as_str());
                false
            }
        }
    }

    fn add_tag_name(&mut self, sql: &mut SqlBuffer, relation: Relation) -> bool {
        let tag_name = format!("%{}%", self.reader.value());

        match relation {
            Relation::Equal | Relation::Like => {
                sql.push_str(" (Images.id IN ");
                sql.push_str(TAG_NAME_SUBQUERY);
                sql.bind(tag_name);
            }
            Relation::Unequal | Relation::NotLike => {
                sql.push_str(" (Images.id NOT IN ");
                sql.push_str(TAG_NAME_SUBQUERY);
                sql.bind(tag_name);
            }
            Relation::InTree | Relation::NotInTree => {
                sql.push_str(if relation == Relation::InTree {
                    " (Images.id IN "
                } else {
                    " (Images.id NOT IN "
                });
                sql.push_str(TAG_NAME_TREE_SUBQUERY);
                sql.bind(tag_name.clone());
                sql.bind(tag_name);
            }
            other => {
                debug!("Relation {} is not supported for tagname", other.as_str());
                return false;
            }
        }
        true
    }

    fn add_page_orientation(&mut self, sql: &mut SqlBuffer, relation: Relation) -> bool {
        if relation != Relation::Equal {
            debug!("Relation {} is not supported for pageorientation", relation.as_str());
            return false;
        }

        // 1 landscape, 2 portrait, 3 and 4 the same ignoring the Exif orientation
        match self.reader.value_to_int() {
            1 => {
                sql.push_str(
                    " ( (ImageInformation.orientation <= ? AND ImageInformation.width >= ImageInformation.height) \
                     OR (ImageInformation.orientation >= ? AND ImageInformation.width <= ImageInformation.height) ) ",
                );
                sql.bind(ORIENTATION_VFLIP);
                sql.bind(ORIENTATION_ROT_90_HFLIP);
            }
            2 => {
                sql.push_str(
                    " ( (ImageInformation.orientation <= ? AND ImageInformation.width < ImageInformation.height) \
                     OR (ImageInformation.orientation >= ? AND ImageInformation.width > ImageInformation.height) ) ",
                );
                sql.bind(ORIENTATION_VFLIP);
                sql.bind(ORIENTATION_ROT_90_HFLIP);
            }
            3 => sql.push_str(" ( ImageInformation.width >= ImageInformation.height) "),
            4 => sql.push_str(" ( ImageInformation.width <= ImageInformation.height) "),
            other => {
                warn!("Invalid page orientation {}", other);
                return false;
            }
        }
        true
    }

    /// Size along an axis, taking rotated images into account.
    fn add_oriented_size(
        &mut self,
        sql: &mut SqlBuffer,
        relation: Relation,
        column: &str,
        rotated_column: &str,
    ) -> bool {
        sql.push_str(" ( (ImageInformation.orientation <= ? AND ");
        sql.bind(ORIENTATION_VFLIP);
        if !FieldQueryBuilder::new(sql, &mut self.reader, relation).add_int_field(column) {
            return false;
        }

        sql.push_str(") OR (ImageInformation.orientation >= ? AND ");
        sql.bind(ORIENTATION_ROT_90_HFLIP);
        if !FieldQueryBuilder::new(sql, &mut self.reader, relation).add_int_field(rotated_column) {
            return false;
        }

        sql.push_str(" ) ) ");
        true
    }

    fn add_image_aspect_ratio(&mut self, sql: &mut SqlBuffer) -> bool {
        let text = self
            .reader
            .value_to_string_or_string_list()
            .into_iter()
            .next()
            .unwrap_or_default();

        let Some(ratio) = parse_aspect_ratio(&text) else {
            warn!("Invalid aspect ratio '{}'", text);
            return false;
        };

        sql.push_str(&format!(
            " (abs((ImageInformation.width/CAST(ImageInformation.height as REAL)) - ?)  < {}) ",
            ASPECT_RATIO_TOLERANCE
        ));
        sql.bind(ratio);
        true
    }

    fn add_video_aspect_ratio(&mut self, sql: &mut SqlBuffer, relation: Relation) -> bool {
        let values = if relation == Relation::OneOf {
            self.reader.value_to_string_list()
        } else {
            vec![self.reader.value()]
        };

        if values.is_empty() {
            debug!("List for OneOf is empty");
            return false;
        }

        let ratios: Vec<f64> = values.iter().filter_map(|value| parse_aspect_ratio(value)).collect();

        sql.push_str(" (VideoMetadata.aspectRatio IN (");
        sql.add_placeholders(values.len());
        sql.push_str(")");
        for _ in &ratios {
            sql.push_str(&format!(
                " OR abs(CAST(VideoMetadata.aspectRatio as REAL) - ?) < {}",
                ASPECT_RATIO_TOLERANCE
            ));
        }
        sql.push_str(") ");

        for value in values {
            sql.bind(value);
        }
        for ratio in ratios {
            sql.bind(ratio);
        }
        true
    }

    /// Range over a column stored as text; Interval is closed, anything else open.
    fn add_cast_interval<T: Into<super::SqlParam>>(
        &mut self,
        sql: &mut SqlBuffer,
        relation: Relation,
        expression: &str,
        values: Vec<T>,
    ) -> bool {
        let range = if relation == Relation::Interval {
            Relation::Interval
        } else {
            Relation::IntervalOpen
        };
        FieldQueryBuilder::new(sql, &mut self.reader, range).add_interval(expression, values)
    }

    fn add_audio_channel_type(&mut self, sql: &mut SqlBuffer, relation: Relation) -> bool {
        let values = if relation == Relation::OneOf {
            self.reader.value_to_string_list()
        } else {
            vec![self.reader.value()]
        };

        if values.is_empty() {
            debug!("List for OneOf is empty");
            return false;
        }

        let mut channels = Vec::new();
        for value in values {
            let alias = match value.as_str() {
                "1" => Some("Mono"),
                "2" => Some("Stereo"),
                _ => None,
            };
            channels.push(value);
            if let Some(alias) = alias {
                channels.push(alias.to_string());
            }
        }

        sql.push_str(" (VideoMetadata.audioChannelType IN (");
        sql.add_placeholders(channels.len());
        sql.push_str(")) ");
        for channel in channels {
            sql.bind(channel);
        }
        true
    }

    fn add_video_codec(&mut self, sql: &mut SqlBuffer, relation: Relation) -> bool {
        let values = if relation == Relation::OneOf {
            self.reader.value_to_string_list()
        } else {
            vec![self.reader.value()]
        };

        if values.is_empty() {
            debug!("List for OneOf is empty");
            return false;
        }

        let terms = vec!["Upper(VideoMetadata.videoCodec) LIKE ?"; values.len()];
        sql.push_str(&format!(" ({}) ", terms.join(" OR ")));
        for value in values {
            sql.bind(format!("%{}%", value.to_uppercase()));
        }
        true
    }

    fn add_comment(&mut self, sql: &mut SqlBuffer, relation: Relation, comment_type: i32, column: &str) -> bool {
        let value = prepare_for_like(relation, &self.reader.value());

        sql.push_str(&format!(
            " (Images.id IN (SELECT imageid FROM ImageComments WHERE type=? AND {} ",
            column
        ));
        sql.add_relation(relation);
        sql.push_str(" ?)) ");
        sql.bind(comment_type);
        sql.bind(value);
        true
    }

    fn add_image_tag_property(&mut self, sql: &mut SqlBuffer, relation: Relation) -> bool {
        if relation != Relation::Equal && relation != Relation::InTree {
            debug!("Relation {} is not supported for imagetagproperty", relation.as_str());
            return false;
        }

        let tag_id = self
            .reader
            .attribute("tagid")
            .and_then(|text| text.trim().parse::<i32>().ok())
            .unwrap_or(0);

        let values = self.reader.value_to_string_or_string_list();
        if values.is_empty() || values.len() > 2 {
            debug!(
                "The imagetagproperty field requires one value (property) or two values (property, value)"
            );
            return false;
        }

        let table = if self.builder.image_tag_properties_joined {
            "ImageTagProperties."
        } else {
            ""
        };

        let mut condition = String::new();
        let mut condition_values = SqlBuffer::new();
        if tag_id != 0 {
            if relation == Relation::Equal {
                condition.push_str(&format!("{}tagid=? AND ", table));
                condition_values.bind(tag_id);
            } else {
                condition.push_str(&format!(
                    "({0}tagid=? OR {0}tagid IN (SELECT id FROM TagsTree WHERE pid=?)) AND ",
                    table
                ));
                condition_values.bind(tag_id);
                condition_values.bind(tag_id);
            }
        }

        condition.push_str(&format!("{}property=? ", table));
        condition_values.bind(values[0].as_str());
        if let Some(value) = values.get(1) {
            condition.push_str(&format!("AND {}value {} ? ", table, relation.to_sql()));
            condition_values.bind(prepare_for_like(relation, value));
        }

        if self.builder.image_tag_properties_joined {
            sql.push_str(&format!(" ( {} ) ", condition));
        } else {
            sql.push_str(&format!(
                " (Images.id IN (SELECT imageid FROM ImageTagProperties WHERE {} )) ",
                condition
            ));
        }
        sql.append(condition_values);
        true
    }

    /// OR over the text fields, each matched against the same keyword.
    fn add_keyword(&mut self, sql: &mut SqlBuffer, relation: Relation) -> bool {
        sql.push_str(" ( ");
        for (index, delegate) in KEYWORD_DELEGATES.iter().enumerate() {
            sql.add_operator(Operator::Or, index == 0);

            let mut fragment = SqlBuffer::new();
            if self.build_field(&mut fragment, delegate, relation) {
                sql.append(fragment);
            } else {
                // false is the neutral term of an OR chain
                sql.push_str(" 0 ");
            }
        }
        sql.push_str(" ) ");
        true
    }
}

/// `w:h` or a decimal number.
fn parse_aspect_ratio(text: &str) -> Option<f64> {
    let text = text.trim();

    if let Some((width, height)) = text.split_once(':') {
        let width: u32 = width.parse().ok()?;
        let height: u32 = height.parse().ok()?;
        if height == 0 {
            return None;
        }
        return Some(width as f64 / height as f64);
    }

    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    text.parse().ok()
}
