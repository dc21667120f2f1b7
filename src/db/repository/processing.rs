//! Processing-audit repository.

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::super::DatabaseError;
use crate::models::{ProcessedVideo, TranscriptionStatus};

pub fn insert_processed_video(
    conn: &Connection,
    rec: &ProcessedVideo,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO processed_videos (id, post_url, handle, processed_at, caption,
         transcript, transcription_status, asr_metrics, filter_decisions, wines_found, error)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            rec.id.to_string(),
            rec.post_url,
            rec.handle,
            rec.processed_at,
            rec.caption,
            rec.transcript,
            rec.transcription_status.as_str(),
            rec.asr_metrics
                .as_ref()
                .and_then(|m| serde_json::to_string(m).ok()),
            serde_json::to_string(&rec.filter_decisions).unwrap_or_else(|_| "[]".into()),
            rec.wines_found,
            rec.error,
        ],
    )?;
    Ok(())
}

/// Most recent audit record for a post URL, if any attempt was made.
pub fn find_latest_attempt(
    conn: &Connection,
    post_url: &str,
) -> Result<Option<ProcessedVideo>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, post_url, handle, processed_at, caption, transcript,
                transcription_status, asr_metrics, filter_decisions, wines_found, error
         FROM processed_videos WHERE post_url = ?1
         ORDER BY processed_at DESC LIMIT 1",
    )?;
    let row = stmt
        .query_row(params![post_url], processed_from_row)
        .optional()?;
    row.transpose()
}

pub fn count_processed(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM processed_videos", [], |row| row.get(0))?;
    Ok(count)
}

fn processed_from_row(
    row: &Row<'_>,
) -> rusqlite::Result<Result<ProcessedVideo, DatabaseError>> {
    let id: String = row.get(0)?;
    let status: String = row.get(6)?;
    let metrics: Option<String> = row.get(7)?;
    let decisions: String = row.get(8)?;

    Ok((|| {
        Ok(ProcessedVideo {
            id: Uuid::parse_str(&id).map_err(|_| DatabaseError::InvalidEnum {
                field: "id".into(),
                value: id.clone(),
            })?,
            post_url: row_get(row, 1)?,
            handle: row_get(row, 2)?,
            processed_at: row_get(row, 3)?,
            caption: row_get(row, 4)?,
            transcript: row_get(row, 5)?,
            transcription_status: TranscriptionStatus::parse(&status).ok_or(
                DatabaseError::InvalidEnum {
                    field: "transcription_status".into(),
                    value: status.clone(),
                },
            )?,
            asr_metrics: metrics
                .as_deref()
                .map(serde_json::from_str)
                .transpose()
                .map_err(|e| DatabaseError::InvalidJson {
                    column: "asr_metrics".into(),
                    reason: e.to_string(),
                })?,
            filter_decisions: serde_json::from_str(&decisions).map_err(|e| {
                DatabaseError::InvalidJson {
                    column: "filter_decisions".into(),
                    reason: e.to_string(),
                }
            })?,
            wines_found: row_get(row, 9)?,
            error: row_get(row, 10)?,
        })
    })())
}

fn row_get<T: rusqlite::types::FromSql>(
    row: &Row<'_>,
    idx: usize,
) -> Result<T, DatabaseError> {
    row.get(idx).map_err(DatabaseError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::{AsrMetrics, FilterDecision};

    #[test]
    fn audit_record_round_trip() {
        let conn = open_memory_database().unwrap();
        let mut rec = ProcessedVideo::new("https://t/v/1", "tester");
        rec.transcription_status = TranscriptionStatus::Success;
        rec.transcript = Some("proost!".into());
        rec.asr_metrics = Some(AsrMetrics {
            version: "lexicon_two_pass_v2".into(),
            pass1_chars: 120,
            pass2_chars: 130,
            pass2_used: true,
            lexicon_hits: 4,
            lexicon_hits_per_1k: 30.8,
            oov_rate: 0.25,
            runtime_ms: 900,
        });
        rec.filter_decisions.push(FilterDecision {
            candidate_name: "Huiswijn".into(),
            reason: "unknown supermarket: Spar".into(),
        });
        insert_processed_video(&conn, &rec).unwrap();

        let fetched = find_latest_attempt(&conn, "https://t/v/1").unwrap().unwrap();
        assert_eq!(fetched.transcription_status, TranscriptionStatus::Success);
        assert_eq!(fetched.asr_metrics.unwrap().lexicon_hits, 4);
        assert_eq!(fetched.filter_decisions.len(), 1);
    }

    #[test]
    fn latest_attempt_wins() {
        let conn = open_memory_database().unwrap();
        let first = ProcessedVideo::new("https://t/v/2", "tester");
        insert_processed_video(&conn, &first).unwrap();

        let mut second = ProcessedVideo::new("https://t/v/2", "tester");
        second.processed_at = first.processed_at + chrono::Duration::seconds(60);
        second.wines_found = 1;
        insert_processed_video(&conn, &second).unwrap();

        let fetched = find_latest_attempt(&conn, "https://t/v/2").unwrap().unwrap();
        assert_eq!(fetched.wines_found, 1);
    }
}
