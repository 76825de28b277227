//! The callable assistant actions.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use super::{AssistantAction, ParameterSpec};
use crate::db::interviews::{InterviewRecord, InterviewRepository, InterviewStatus, NewInterview};
use crate::db::users::{UserRecord, UserRepository};
use crate::db::Database;

/// Validation failure for an action's parameter bag.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("invalid parameters: {0}")]
    InvalidParams(#[from] serde_json::Error),
    #[error("invalid date/time: {date} {time}")]
    InvalidTimestamp { date: String, time: String },
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Combine `YYYY-MM-DD` and `HH:mm[:ss]` into epoch milliseconds.
fn combine_timestamp(date: &str, time: &str) -> Option<i64> {
    let stamp = format!("{}T{}", date, time);
    let parsed = NaiveDateTime::parse_from_str(&stamp, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(&stamp, "%Y-%m-%dT%H:%M:%S"))
        .ok()?;
    Some(parsed.and_utc().timestamp_millis())
}

// ============================================================================
// scheduleMeeting
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ScheduleMeetingRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: String,
    pub time: String,
    #[serde(rename = "candidateId")]
    pub candidate_id: String,
    #[serde(rename = "interviewerIds")]
    pub interviewer_ids: Vec<String>,
}

pub struct ScheduleMeeting {
    db: Database,
}

impl ScheduleMeeting {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn schedule(&self, params: Value) -> Result<(), ActionError> {
        let request: ScheduleMeetingRequest = serde_json::from_value(params)?;

        let start_time = combine_timestamp(&request.date, &request.time).ok_or_else(|| {
            ActionError::InvalidTimestamp {
                date: request.date.clone(),
                time: request.time.clone(),
            }
        })?;

        let interview = NewInterview {
            title: request.title,
            description: request.description,
            start_time,
            status: InterviewStatus::Upcoming,
            stream_call_id: Uuid::new_v4().to_string(),
            candidate_id: request.candidate_id,
            interviewer_ids: request.interviewer_ids,
        };

        let id = self
            .db
            .with_conn(|conn| InterviewRepository::insert(conn, &interview))
            .await?;

        info!("Scheduled interview {} at {}", id, start_time);
        Ok(())
    }
}

#[async_trait]
impl AssistantAction for ScheduleMeeting {
    fn name(&self) -> &'static str {
        "scheduleMeeting"
    }

    fn description(&self) -> &'static str {
        "Schedule a new meeting with title, description, date, time, candidateId, and interviewerIds."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![
            ParameterSpec { name: "title", kind: "string", description: "Meeting title" },
            ParameterSpec { name: "description", kind: "string", description: "Meeting description" },
            ParameterSpec { name: "date", kind: "string", description: "Date in YYYY-MM-DD format" },
            ParameterSpec { name: "time", kind: "string", description: "Time in HH:mm format" },
            ParameterSpec { name: "candidateId", kind: "string", description: "Candidate user ID" },
            ParameterSpec { name: "interviewerIds", kind: "string[]", description: "Array of interviewer user IDs" },
        ]
    }

    async fn invoke(&self, params: Value) -> Value {
        match self.schedule(params).await {
            Ok(()) => json!({"success": true, "message": "Meeting scheduled!"}),
            Err(err) => json!({
                "success": false,
                "message": format!("Error scheduling meeting: {}", err),
            }),
        }
    }
}

// ============================================================================
// checkPendingMeetings
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CheckPendingMeetingsRequest {
    #[serde(rename = "userId")]
    pub user_id: String,
}

pub struct CheckPendingMeetings {
    db: Database,
}

impl CheckPendingMeetings {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn pending_for(
        &self,
        params: Value,
    ) -> Result<Option<Vec<InterviewRecord>>, ActionError> {
        let request: CheckPendingMeetingsRequest = serde_json::from_value(params)?;

        let (users, meetings) = self
            .db
            .with_conn(|conn| {
                Ok((
                    UserRepository::list(conn)?,
                    InterviewRepository::list(conn)?,
                ))
            })
            .await?;

        let Some(user) = users.into_iter().find(|u| u.id == request.user_id) else {
            return Ok(None);
        };

        let pending = meetings
            .into_iter()
            .filter(|m| {
                m.status == InterviewStatus::Upcoming.as_str()
                    && (m.candidate_id == user.id || m.interviewer_ids.contains(&user.id))
            })
            .collect();

        Ok(Some(pending))
    }
}

#[async_trait]
impl AssistantAction for CheckPendingMeetings {
    fn name(&self) -> &'static str {
        "checkPendingMeetings"
    }

    fn description(&self) -> &'static str {
        "Check for pending (upcoming) meetings for a user."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![ParameterSpec {
            name: "userId",
            kind: "string",
            description: "User ID to check for pending meetings",
        }]
    }

    async fn invoke(&self, params: Value) -> Value {
        match self.pending_for(params).await {
            Ok(Some(pending)) => json!({"pending": pending}),
            Ok(None) => json!({"pending": [], "message": "User not found"}),
            Err(err) => json!({
                "pending": [],
                "message": format!("Error fetching meetings: {}", err),
            }),
        }
    }
}

// ============================================================================
// listPassedCandidates / listFailedCandidates
// ============================================================================

/// Candidate display names for meetings that ended in the given status,
/// de-duplicated by candidate identifier.
async fn candidate_names_by_status(
    db: &Database,
    status: InterviewStatus,
) -> Result<Vec<String>, ActionError> {
    let (users, meetings) = db
        .with_conn(|conn| {
            Ok((
                UserRepository::list(conn)?,
                InterviewRepository::list(conn)?,
            ))
        })
        .await?;

    let candidates: Vec<UserRecord> = users
        .into_iter()
        .filter(|u| u.role == "candidate")
        .collect();

    let mut candidate_ids: Vec<String> = Vec::new();
    for meeting in meetings.iter().filter(|m| m.status == status.as_str()) {
        if !candidate_ids.contains(&meeting.candidate_id) {
            candidate_ids.push(meeting.candidate_id.clone());
        }
    }

    Ok(candidates
        .into_iter()
        .filter(|c| candidate_ids.contains(&c.id))
        .map(|c| c.name)
        .collect())
}

pub struct ListPassedCandidates {
    db: Database,
}

impl ListPassedCandidates {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AssistantAction for ListPassedCandidates {
    fn name(&self) -> &'static str {
        "listPassedCandidates"
    }

    fn description(&self) -> &'static str {
        "List the names of candidates whose interviews succeeded."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        Vec::new()
    }

    async fn invoke(&self, _params: Value) -> Value {
        match candidate_names_by_status(&self.db, InterviewStatus::Succeeded).await {
            Ok(candidates) => json!({"candidates": candidates}),
            Err(err) => json!({
                "candidates": [],
                "message": format!("Error fetching passed candidates: {}", err),
            }),
        }
    }
}

pub struct ListFailedCandidates {
    db: Database,
}

impl ListFailedCandidates {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AssistantAction for ListFailedCandidates {
    fn name(&self) -> &'static str {
        "listFailedCandidates"
    }

    fn description(&self) -> &'static str {
        "List the names of candidates whose interviews failed."
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        Vec::new()
    }

    async fn invoke(&self, _params: Value) -> Value {
        match candidate_names_by_status(&self.db, InterviewStatus::Failed).await {
            Ok(candidates) => json!({"candidates": candidates}),
            Err(err) => json!({
                "candidates": [],
                "message": format!("Error fetching failed candidates: {}", err),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::users::UserRole;

    async fn seed_db() -> Database {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            UserRepository::insert(conn, "u1", "Ada", None, UserRole::Candidate)?;
            UserRepository::insert(conn, "u2", "Grace", None, UserRole::Candidate)?;
            UserRepository::insert(conn, "u3", "Linus", None, UserRole::Interviewer)?;
            Ok(())
        })
        .await
        .unwrap();
        db
    }

    fn interview(
        candidate: &str,
        interviewers: &[&str],
        status: InterviewStatus,
    ) -> NewInterview {
        NewInterview {
            title: "Screen".to_string(),
            description: String::new(),
            start_time: 1_700_000_000_000,
            status,
            stream_call_id: "call".to_string(),
            candidate_id: candidate.to_string(),
            interviewer_ids: interviewers.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_schedule_meeting_success() {
        let db = seed_db().await;
        let action = ScheduleMeeting::new(db.clone());

        let result = action
            .invoke(json!({
                "title": "System design",
                "description": "Round two",
                "date": "2026-09-01",
                "time": "14:30",
                "candidateId": "u1",
                "interviewerIds": ["u3"],
            }))
            .await;

        assert_eq!(result["success"], json!(true));
        assert_eq!(result["message"], json!("Meeting scheduled!"));

        let interviews = db
            .with_conn(InterviewRepository::list)
            .await
            .unwrap();
        assert_eq!(interviews.len(), 1);
        assert_eq!(interviews[0].status, "upcoming");
        assert!(!interviews[0].stream_call_id.is_empty());
    }

    #[tokio::test]
    async fn test_schedule_meeting_invalid_time() {
        let db = seed_db().await;
        let action = ScheduleMeeting::new(db);

        let result = action
            .invoke(json!({
                "title": "Broken",
                "date": "2026-09-01",
                "time": "quarter past noon",
                "candidateId": "u1",
                "interviewerIds": [],
            }))
            .await;

        assert_eq!(result["success"], json!(false));
        let message = result["message"].as_str().unwrap();
        assert!(message.starts_with("Error scheduling meeting:"), "{}", message);
    }

    #[tokio::test]
    async fn test_schedule_meeting_missing_params() {
        let db = seed_db().await;
        let action = ScheduleMeeting::new(db);

        let result = action.invoke(json!({"title": "No date"})).await;
        assert_eq!(result["success"], json!(false));
    }

    #[tokio::test]
    async fn test_schedule_meeting_store_rejection() {
        let db = seed_db().await;
        // Force the collaborator mutation to fail.
        db.with_conn(|conn| {
            conn.execute("DROP TABLE interviews", [])?;
            Ok(())
        })
        .await
        .unwrap();

        let action = ScheduleMeeting::new(db);
        let result = action
            .invoke(json!({
                "title": "Doomed",
                "date": "2026-09-01",
                "time": "10:00",
                "candidateId": "u1",
                "interviewerIds": [],
            }))
            .await;

        assert_eq!(result["success"], json!(false));
        assert!(result["message"]
            .as_str()
            .unwrap()
            .starts_with("Error scheduling meeting:"));
    }

    #[tokio::test]
    async fn test_check_pending_unknown_user() {
        let db = seed_db().await;
        let action = CheckPendingMeetings::new(db);

        let result = action.invoke(json!({"userId": "ghost"})).await;
        assert_eq!(result["pending"], json!([]));
        assert_eq!(result["message"], json!("User not found"));
    }

    #[tokio::test]
    async fn test_check_pending_filters_by_participation_and_status() {
        let db = seed_db().await;
        db.with_conn(|conn| {
            InterviewRepository::insert(
                conn,
                &interview("u1", &["u3"], InterviewStatus::Upcoming),
            )?;
            InterviewRepository::insert(
                conn,
                &interview("u2", &["u3"], InterviewStatus::Upcoming),
            )?;
            InterviewRepository::insert(
                conn,
                &interview("u1", &["u3"], InterviewStatus::Succeeded),
            )?;
            Ok(())
        })
        .await
        .unwrap();

        let action = CheckPendingMeetings::new(db);

        // u1 is a candidate on one upcoming meeting.
        let result = action.invoke(json!({"userId": "u1"})).await;
        assert_eq!(result["pending"].as_array().unwrap().len(), 1);

        // u3 interviews on both upcoming meetings.
        let result = action.invoke(json!({"userId": "u3"})).await;
        assert_eq!(result["pending"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_passed_and_failed_candidates_deduplicated() {
        let db = seed_db().await;
        db.with_conn(|conn| {
            InterviewRepository::insert(
                conn,
                &interview("u1", &["u3"], InterviewStatus::Succeeded),
            )?;
            InterviewRepository::insert(
                conn,
                &interview("u1", &["u3"], InterviewStatus::Succeeded),
            )?;
            InterviewRepository::insert(
                conn,
                &interview("u2", &["u3"], InterviewStatus::Failed),
            )?;
            Ok(())
        })
        .await
        .unwrap();

        let passed = ListPassedCandidates::new(db.clone())
            .invoke(Value::Null)
            .await;
        assert_eq!(passed["candidates"], json!(["Ada"]));

        let failed = ListFailedCandidates::new(db).invoke(Value::Null).await;
        assert_eq!(failed["candidates"], json!(["Grace"]));
    }

    #[test]
    fn test_combine_timestamp() {
        // 2026-09-01T14:30 UTC
        let ms = combine_timestamp("2026-09-01", "14:30").unwrap();
        assert_eq!(ms % 1000, 0);
        assert!(combine_timestamp("2026-09-01", "14:30:15").is_some());
        assert!(combine_timestamp("soon", "14:30").is_none());
    }
}
