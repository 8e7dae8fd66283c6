//! Database operations module - executing compiled searches.
//!
//! A compiled search is only a WHERE fragment. It is embedded into the
//! standard item query that joins the per-item property tables the
//! fragment may refer to.

use rusqlite::types::ToSqlOutput;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, ToSql};
use tracing::{debug, warn};

use crate::query::{AlbumInfoProvider, CompiledQuery, SqlParam};
use crate::{Result, SearchError};

/// Item query a compiled search is appended to, inside parentheses.
pub const ITEM_QUERY: &str = "SELECT DISTINCT Images.id, \
     ImagePositions.latitudeNumber, ImagePositions.longitudeNumber \
     FROM Images \
     LEFT JOIN ImageInformation ON Images.id = ImageInformation.imageid \
     LEFT JOIN ImageMetadata ON Images.id = ImageMetadata.imageid \
     LEFT JOIN VideoMetadata ON Images.id = VideoMetadata.imageid \
     LEFT JOIN ImagePositions ON Images.id = ImagePositions.imageid \
     LEFT JOIN Albums ON Albums.id = Images.album \
     WHERE Images.status = 1 AND ";

impl ToSql for SqlParam {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlParam::Text(text) => ToSqlOutput::from(text.as_str()),
            SqlParam::Integer(value) => ToSqlOutput::from(*value),
            SqlParam::Real(value) => ToSqlOutput::from(*value),
        })
    }
}

impl AlbumInfoProvider for Connection {
    fn album_location(&self, album_id: i32) -> Option<(i32, String)> {
        let location = self
            .query_row(
                "SELECT albumRoot, relativePath FROM Albums WHERE id = ?1",
                params![album_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional();

        match location {
            Ok(location) => location,
            Err(e) => {
                warn!("Failed to look up album {}: {}", album_id, e);
                None
            }
        }
    }
}

/// Run a compiled search, returning the matching item ids in ascending order.
///
/// Bound values are passed in order. Rows are then checked against the
/// post-filter hooks with their position; when there are hooks, items
/// without a position never match. An empty search matches nothing.
pub fn search_image_ids(conn: &Connection, query: &CompiledQuery) -> Result<Vec<i64>> {
    if query.is_empty() {
        debug!("Empty search, nothing to run");
        return Ok(Vec::new());
    }

    let sql = format!("{} ( {} ) ORDER BY Images.id", ITEM_QUERY, query.sql);

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| SearchError::Database(format!("Failed to prepare search: {}", e)))?;

    let rows = stmt
        .query_map(params_from_iter(query.bound_values.iter()), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<f64>>(1)?,
                row.get::<_, Option<f64>>(2)?,
            ))
        })
        .map_err(|e| SearchError::Database(format!("Failed to execute search: {}", e)))?;

    let mut ids = Vec::new();
    for row in rows {
        let (id, latitude, longitude) =
            row.map_err(|e| SearchError::Database(format!("Failed to read row: {}", e)))?;

        if !query.hooks.is_empty() {
            let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
                continue;
            };
            if !query.hooks.check_position(latitude, longitude) {
                continue;
            }
        }

        ids.push(id);
    }

    debug!("Search matched {} items", ids.len());
    Ok(ids)
}
