//! Field name dispatch table.
//!
//! Maps every searchable field name to how it is compiled: either a generic
//! column encoding or one of the hand written [`CustomField`] handlers.

use std::collections::HashMap;

/// Prefix of field names that never contribute to the query.
pub const NO_EFFECT_PREFIX: &str = "noeffect_";

/// Compilation strategy of a field, with its target column where generic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEncoding {
    Int(&'static str),
    Double(&'static str),
    String(&'static str),
    Date(&'static str),
    /// Small enumerated integers; `-1` in a OneOf list means "no value"
    ChoiceInt(&'static str),
    /// Enumerated strings, `*` wildcards allowed in OneOf lists
    ChoiceString(&'static str),
    /// Flag word tested with `&`
    IntBitmask(&'static str),
    /// 64-bit ids
    LongList(&'static str),
    /// Geographic Near/Inside search on `ImagePositions`
    Position,
    Custom(CustomField),
}

/// Fields whose SQL does not follow one of the generic column shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustomField {
    AlbumId,
    TagId,
    TagName,
    NoTag,
    NoGps,
    PageOrientation,
    Width,
    Height,
    AspectRatioImg,
    VideoAspectRatio,
    VideoAudioBitrate,
    VideoAudioChannelType,
    VideoDuration,
    VideoFrameRate,
    VideoCodec,
    Comment,
    CommentAuthor,
    Headline,
    Title,
    Creator,
    ImageTagProperty,
    Keyword,
    Similarity,
}

/// Lookup table from field name to [`FieldEncoding`].
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    fields: HashMap<String, FieldEncoding>,
}

impl FieldRegistry {
    /// Registry without any field.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with every field of the item database.
    pub fn standard() -> Self {
        use CustomField::*;
        use FieldEncoding::*;

        let entries: &[(&str, FieldEncoding)] = &[
            // Albums
            ("albumid", Custom(AlbumId)),
            ("albumname", String("Albums.relativePath")),
            ("albumcaption", String("Albums.caption")),
            ("albumcollection", ChoiceString("Albums.collection")),
            // Tags
            ("tagid", Custom(TagId)),
            ("labels", Custom(TagId)),
            ("tagname", Custom(TagName)),
            ("notag", Custom(NoTag)),
            ("imagetagproperty", Custom(ImageTagProperty)),
            // Images
            ("imageid", LongList("Images.id")),
            ("filename", String("Images.name")),
            ("modificationdate", Date("Images.modificationDate")),
            ("filesize", Int("Images.fileSize")),
            // ImageInformation
            ("rating", Int("ImageInformation.rating")),
            ("creationdate", Date("ImageInformation.creationDate")),
            ("digitizationdate", Date("ImageInformation.digitizationDate")),
            ("orientation", ChoiceInt("ImageInformation.orientation")),
            ("pageorientation", Custom(PageOrientation)),
            ("width", Custom(Width)),
            ("height", Custom(Height)),
            ("aspectratioimg", Custom(AspectRatioImg)),
            ("pixelsize", Int("(ImageInformation.width * ImageInformation.height)")),
            ("pixels", Int("(ImageInformation.width * ImageInformation.height)")),
            ("format", ChoiceString("ImageInformation.format")),
            ("colordepth", Int("ImageInformation.colorDepth")),
            ("colormodel", Int("ImageInformation.colorModel")),
            // VideoMetadata
            ("videoaspectratio", Custom(VideoAspectRatio)),
            ("videoaudiobitrate", Custom(VideoAudioBitrate)),
            ("videoaudiochanneltype", Custom(VideoAudioChannelType)),
            ("videoaudioCodec", ChoiceString("VideoMetadata.audioCompressor")),
            ("videoduration", Custom(VideoDuration)),
            ("videoframerate", Custom(VideoFrameRate)),
            ("videocodec", Custom(VideoCodec)),
            // ImageMetadata
            ("make", ChoiceString("ImageMetadata.make")),
            ("model", ChoiceString("ImageMetadata.model")),
            ("lenses", ChoiceString("ImageMetadata.lens")),
            ("aperture", Double("ImageMetadata.aperture")),
            ("focallength", Double("ImageMetadata.focalLength")),
            ("focallength35", Double("ImageMetadata.focalLength35")),
            ("exposuretime", Double("ImageMetadata.exposureTime")),
            ("exposureprogram", ChoiceInt("ImageMetadata.exposureProgram")),
            ("exposuremode", ChoiceInt("ImageMetadata.exposureMode")),
            ("sensitivity", Int("ImageMetadata.sensitivity")),
            ("flashmode", IntBitmask("ImageMetadata.flash")),
            ("whitebalance", ChoiceInt("ImageMetadata.whiteBalance")),
            (
                "whitebalancecolortemperature",
                Int("ImageMetadata.whiteBalanceColorTemperature"),
            ),
            ("meteringmode", ChoiceInt("ImageMetadata.meteringMode")),
            ("subjectdistance", Double("ImageMetadata.subjectDistance")),
            (
                "subjectdistancecategory",
                ChoiceInt("ImageMetadata.subjectDistanceCategory"),
            ),
            // ImagePositions
            ("position", Position),
            ("latitude", Double("ImagePositions.latitudeNumber")),
            ("longitude", Double("ImagePositions.longitudeNumber")),
            ("altitude", Double("ImagePositions.altitude")),
            ("positionorientation", Double("ImagePositions.orientation")),
            ("positiontilt", Double("ImagePositions.tilt")),
            ("positionroll", Double("ImagePositions.roll")),
            ("positiondescription", String("ImagePositions.description")),
            ("nogps", Custom(NoGps)),
            // ImageComments and ImageCopyright
            ("comment", Custom(Comment)),
            ("commentauthor", Custom(CommentAuthor)),
            ("headline", Custom(Headline)),
            ("title", Custom(Title)),
            ("creator", Custom(Creator)),
            // Composite
            ("keyword", Custom(Keyword)),
            ("similarity", Custom(Similarity)),
        ];

        let mut registry = Self::empty();
        for (name, encoding) in entries {
            registry.register(name, *encoding);
        }
        registry
    }

    /// Add or replace a field.
    pub fn register(&mut self, name: &str, encoding: FieldEncoding) {
        self.fields.insert(name.to_string(), encoding);
    }

    pub fn lookup(&self, name: &str) -> Option<FieldEncoding> {
        self.fields.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fields.keys().map(|name| name.as_str()).collect();
        names.sort_unstable();
        names
    }
}
