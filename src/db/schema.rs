//! Database schema module - the item tables searches are compiled against.
//!
//! Only the tables and columns referenced by compiled searches are created.
//! A real photo library has more of both; queries only need these.

use rusqlite::Connection;

use crate::{Result, SearchError};

/// Initialize the item schema.
///
/// Creates the tables if they don't already exist, so it is safe to call on
/// every open.
///
/// # Tables
///
/// - `Albums`: physical albums, identified by root and relative path
/// - `Images`: one row per item, `status = 1` for visible items
/// - `ImageInformation`, `ImageMetadata`, `VideoMetadata`, `ImagePositions`:
///   per-item properties, at most one row per item
/// - `ImageComments`, `ImageCopyright`: typed text properties, any number per item
/// - `Tags`, `TagsTree`, `ImageTags`, `ImageTagProperties`: the tag hierarchy,
///   its closure table and tag assignments
pub fn init(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS Albums (
            id INTEGER PRIMARY KEY,
            albumRoot INTEGER NOT NULL,
            relativePath TEXT NOT NULL,
            date DATE,
            caption TEXT,
            collection TEXT,
            icon INTEGER,
            UNIQUE(albumRoot, relativePath)
        );

        CREATE TABLE IF NOT EXISTS Images (
            id INTEGER PRIMARY KEY,
            album INTEGER REFERENCES Albums(id),
            name TEXT NOT NULL,
            status INTEGER NOT NULL DEFAULT 1,
            category INTEGER NOT NULL DEFAULT 1,
            modificationDate DATETIME,
            fileSize INTEGER,
            uniqueHash TEXT,
            UNIQUE(album, name)
        );

        CREATE TABLE IF NOT EXISTS ImageInformation (
            imageid INTEGER PRIMARY KEY,
            rating INTEGER,
            creationDate DATETIME,
            digitizationDate DATETIME,
            orientation INTEGER,
            width INTEGER,
            height INTEGER,
            format TEXT,
            colorDepth INTEGER,
            colorModel INTEGER
        );

        CREATE TABLE IF NOT EXISTS ImageMetadata (
            imageid INTEGER PRIMARY KEY,
            make TEXT,
            model TEXT,
            lens TEXT,
            aperture REAL,
            focalLength REAL,
            focalLength35 REAL,
            exposureTime REAL,
            exposureProgram INTEGER,
            exposureMode INTEGER,
            sensitivity INTEGER,
            flash INTEGER,
            whiteBalance INTEGER,
            whiteBalanceColorTemperature INTEGER,
            meteringMode INTEGER,
            subjectDistance REAL,
            subjectDistanceCategory INTEGER
        );

        CREATE TABLE IF NOT EXISTS VideoMetadata (
            imageid INTEGER PRIMARY KEY,
            aspectRatio TEXT,
            audioBitRate TEXT,
            audioChannelType TEXT,
            audioCompressor TEXT,
            duration TEXT,
            frameRate TEXT,
            exposureProgram INTEGER,
            videoCodec TEXT
        );

        CREATE TABLE IF NOT EXISTS ImagePositions (
            imageid INTEGER PRIMARY KEY,
            latitude TEXT,
            latitudeNumber REAL,
            longitude TEXT,
            longitudeNumber REAL,
            altitude REAL,
            orientation REAL,
            tilt REAL,
            roll REAL,
            accuracy REAL,
            description TEXT
        );

        CREATE TABLE IF NOT EXISTS ImageComments (
            id INTEGER PRIMARY KEY,
            imageid INTEGER NOT NULL,
            type INTEGER,
            language TEXT,
            author TEXT,
            date DATETIME,
            comment TEXT
        );

        CREATE TABLE IF NOT EXISTS ImageCopyright (
            id INTEGER PRIMARY KEY,
            imageid INTEGER NOT NULL,
            property TEXT,
            value TEXT,
            extraValue TEXT
        );

        CREATE TABLE IF NOT EXISTS Tags (
            id INTEGER PRIMARY KEY,
            pid INTEGER,
            name TEXT NOT NULL,
            icon INTEGER,
            UNIQUE(name, pid)
        );

        -- closure of the tag hierarchy: one row per (tag, ancestor)
        CREATE TABLE IF NOT EXISTS TagsTree (
            id INTEGER NOT NULL,
            pid INTEGER NOT NULL,
            UNIQUE(id, pid)
        );

        CREATE TABLE IF NOT EXISTS ImageTags (
            imageid INTEGER NOT NULL,
            tagid INTEGER NOT NULL,
            UNIQUE(imageid, tagid)
        );

        CREATE TABLE IF NOT EXISTS ImageTagProperties (
            imageid INTEGER,
            tagid INTEGER,
            property TEXT,
            value TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_images_album ON Images(album);
        CREATE INDEX IF NOT EXISTS idx_image_tags_tag ON ImageTags(tagid);
        CREATE INDEX IF NOT EXISTS idx_image_comments_image ON ImageComments(imageid);
        CREATE INDEX IF NOT EXISTS idx_image_copyright_image ON ImageCopyright(imageid);
        "#,
    )
    .map_err(|e| SearchError::Database(format!("Failed to initialize schema: {}", e)))?;

    Ok(())
}
