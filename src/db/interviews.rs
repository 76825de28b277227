//! Interview record persistence.
//!
//! Interviews are the meeting records the assistant actions schedule and
//! query. The interviewer id list is stored as a JSON array column.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewStatus {
    Upcoming,
    Completed,
    Succeeded,
    Failed,
}

impl InterviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Completed => "completed",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "upcoming" => Ok(Self::Upcoming),
            "completed" => Ok(Self::Completed),
            "succeeded" => Ok(Self::Succeeded),
            "failed" => Ok(Self::Failed),
            _ => anyhow::bail!("Invalid interview status: {}", s),
        }
    }
}

/// A new interview to insert.
#[derive(Debug, Clone)]
pub struct NewInterview {
    pub title: String,
    pub description: String,
    /// Scheduled start, milliseconds since the epoch.
    pub start_time: i64,
    pub status: InterviewStatus,
    pub stream_call_id: String,
    pub candidate_id: String,
    pub interviewer_ids: Vec<String>,
}

/// An interview record from the database.
#[derive(Debug, Clone, Serialize)]
pub struct InterviewRecord {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub start_time: i64,
    pub status: String,
    pub stream_call_id: String,
    pub candidate_id: String,
    pub interviewer_ids: Vec<String>,
    pub created_at: String,
}

/// Repository for interview records.
pub struct InterviewRepository;

impl InterviewRepository {
    /// Insert a new interview. Returns the new interview ID.
    pub fn insert(conn: &Connection, interview: &NewInterview) -> Result<i64> {
        let interviewer_ids = serde_json::to_string(&interview.interviewer_ids)
            .context("Failed to serialize interviewer ids")?;

        conn.execute(
            "INSERT INTO interviews (title, description, start_time, status,
             stream_call_id, candidate_id, interviewer_ids)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                interview.title,
                interview.description,
                interview.start_time,
                interview.status.as_str(),
                interview.stream_call_id,
                interview.candidate_id,
                interviewer_ids,
            ],
        )
        .context("Failed to insert interview")?;

        Ok(conn.last_insert_rowid())
    }

    /// Get an interview by ID.
    pub fn get(conn: &Connection, id: i64) -> Result<Option<InterviewRecord>> {
        conn.query_row(
            "SELECT id, title, description, start_time, status, stream_call_id,
             candidate_id, interviewer_ids, created_at
             FROM interviews WHERE id = ?1",
            params![id],
            Self::map_row,
        )
        .optional()
        .context("Failed to query interview")
    }

    /// List all interviews, newest first.
    pub fn list(conn: &Connection) -> Result<Vec<InterviewRecord>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, title, description, start_time, status, stream_call_id,
                 candidate_id, interviewer_ids, created_at
                 FROM interviews ORDER BY start_time DESC, id DESC",
            )
            .context("Failed to prepare interviews query")?;

        let rows = stmt
            .query_map([], Self::map_row)
            .context("Failed to list interviews")?;

        let mut interviews = Vec::new();
        for row in rows {
            interviews.push(row?);
        }

        Ok(interviews)
    }

    /// Update the interview status.
    pub fn update_status(conn: &Connection, id: i64, status: InterviewStatus) -> Result<bool> {
        let updated = conn
            .execute(
                "UPDATE interviews SET status = ?1 WHERE id = ?2",
                params![status.as_str(), id],
            )
            .context("Failed to update interview status")?;
        Ok(updated > 0)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<InterviewRecord> {
        let interviewer_ids: String = row.get(7)?;
        Ok(InterviewRecord {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            start_time: row.get(3)?,
            status: row.get(4)?,
            stream_call_id: row.get(5)?,
            candidate_id: row.get(6)?,
            // Tolerate malformed lists rather than failing the whole query.
            interviewer_ids: serde_json::from_str(&interviewer_ids).unwrap_or_default(),
            created_at: row.get(8)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrate;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    fn sample_interview(candidate: &str, status: InterviewStatus) -> NewInterview {
        NewInterview {
            title: "Backend screen".to_string(),
            description: "First round".to_string(),
            start_time: 1_700_000_000_000,
            status,
            stream_call_id: "call-1".to_string(),
            candidate_id: candidate.to_string(),
            interviewer_ids: vec!["u2".to_string(), "u3".to_string()],
        }
    }

    #[test]
    fn test_insert_and_get() {
        let conn = setup_db();
        let id = InterviewRepository::insert(
            &conn,
            &sample_interview("u1", InterviewStatus::Upcoming),
        )
        .unwrap();

        let interview = InterviewRepository::get(&conn, id).unwrap().unwrap();
        assert_eq!(interview.title, "Backend screen");
        assert_eq!(interview.status, "upcoming");
        assert_eq!(interview.candidate_id, "u1");
        assert_eq!(interview.interviewer_ids, vec!["u2", "u3"]);
    }

    #[test]
    fn test_get_nonexistent() {
        let conn = setup_db();
        assert!(InterviewRepository::get(&conn, 42).unwrap().is_none());
    }

    #[test]
    fn test_list_newest_first() {
        let conn = setup_db();
        let mut early = sample_interview("u1", InterviewStatus::Upcoming);
        early.start_time = 1_000;
        let mut late = sample_interview("u2", InterviewStatus::Upcoming);
        late.start_time = 2_000;

        InterviewRepository::insert(&conn, &early).unwrap();
        InterviewRepository::insert(&conn, &late).unwrap();

        let interviews = InterviewRepository::list(&conn).unwrap();
        assert_eq!(interviews.len(), 2);
        assert_eq!(interviews[0].candidate_id, "u2");
    }

    #[test]
    fn test_update_status() {
        let conn = setup_db();
        let id = InterviewRepository::insert(
            &conn,
            &sample_interview("u1", InterviewStatus::Upcoming),
        )
        .unwrap();

        assert!(InterviewRepository::update_status(&conn, id, InterviewStatus::Succeeded).unwrap());
        let interview = InterviewRepository::get(&conn, id).unwrap().unwrap();
        assert_eq!(interview.status, "succeeded");

        assert!(!InterviewRepository::update_status(&conn, 999, InterviewStatus::Failed).unwrap());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            InterviewStatus::Upcoming,
            InterviewStatus::Completed,
            InterviewStatus::Succeeded,
            InterviewStatus::Failed,
        ] {
            assert_eq!(
                InterviewStatus::from_str(status.as_str()).unwrap(),
                status
            );
        }
        assert!(InterviewStatus::from_str("cancelled").is_err());
    }
}
