//! Source-registry repository.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::super::DatabaseError;
use crate::models::Source;

pub fn upsert_source(conn: &Connection, source: &Source) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO sources (handle, is_active, video_urls, last_scraped,
                              total_videos_processed, total_wines_found)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(handle) DO UPDATE SET
             is_active = excluded.is_active,
             video_urls = excluded.video_urls",
        params![
            source.handle,
            source.is_active as i32,
            serde_json::to_string(&source.video_urls).unwrap_or_else(|_| "[]".into()),
            source.last_scraped,
            source.total_videos_processed,
            source.total_wines_found,
        ],
    )?;
    Ok(())
}

pub fn get_source(conn: &Connection, handle: &str) -> Result<Option<Source>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT handle, is_active, video_urls, last_scraped,
                total_videos_processed, total_wines_found
         FROM sources WHERE handle = ?1",
    )?;
    let row = stmt
        .query_row(params![handle], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i32>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<DateTime<Utc>>>(3)?,
                row.get::<_, u32>(4)?,
                row.get::<_, u32>(5)?,
            ))
        })
        .optional()?;

    row.map(source_from_parts).transpose()
}

pub fn list_active_sources(conn: &Connection) -> Result<Vec<Source>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT handle, is_active, video_urls, last_scraped,
                total_videos_processed, total_wines_found
         FROM sources WHERE is_active = 1 ORDER BY handle",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, i32>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<DateTime<Utc>>>(3)?,
            row.get::<_, u32>(4)?,
            row.get::<_, u32>(5)?,
        ))
    })?;

    let mut sources = Vec::new();
    for row in rows {
        sources.push(source_from_parts(row?)?);
    }
    Ok(sources)
}

/// Bump counters and stamp `last_scraped` after a batch run.
pub fn mark_source_scraped(
    conn: &Connection,
    handle: &str,
    videos_processed: u32,
    wines_found: u32,
    at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE sources SET
             last_scraped = ?2,
             total_videos_processed = total_videos_processed + ?3,
             total_wines_found = total_wines_found + ?4
         WHERE handle = ?1",
        params![handle, at, videos_processed, wines_found],
    )?;
    Ok(())
}

type SourceParts = (String, i32, String, Option<DateTime<Utc>>, u32, u32);

fn source_from_parts(parts: SourceParts) -> Result<Source, DatabaseError> {
    let (handle, is_active, video_urls, last_scraped, videos, wines) = parts;
    Ok(Source {
        handle,
        is_active: is_active != 0,
        video_urls: serde_json::from_str(&video_urls).map_err(|e| DatabaseError::InvalidJson {
            column: "video_urls".into(),
            reason: e.to_string(),
        })?,
        last_scraped,
        total_videos_processed: videos,
        total_wines_found: wines,
    })
}
