//! User record persistence.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

/// Role of a platform user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Candidate,
    Interviewer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Candidate => "candidate",
            Self::Interviewer => "interviewer",
        }
    }

    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "candidate" => Ok(Self::Candidate),
            "interviewer" => Ok(Self::Interviewer),
            _ => anyhow::bail!("Invalid user role: {}", s),
        }
    }
}

/// A user record from the database.
#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: String,
    pub created_at: String,
}

/// Repository for user records.
pub struct UserRepository;

impl UserRepository {
    /// Insert a user with an externally assigned identifier.
    pub fn insert(
        conn: &Connection,
        id: &str,
        name: &str,
        email: Option<&str>,
        role: UserRole,
    ) -> Result<()> {
        conn.execute(
            "INSERT INTO users (id, name, email, role) VALUES (?1, ?2, ?3, ?4)",
            params![id, name, email, role.as_str()],
        )
        .context("Failed to insert user")?;
        Ok(())
    }

    /// Get a user by ID.
    pub fn get(conn: &Connection, id: &str) -> Result<Option<UserRecord>> {
        conn.query_row(
            "SELECT id, name, email, role, created_at FROM users WHERE id = ?1",
            params![id],
            Self::map_row,
        )
        .optional()
        .context("Failed to query user")
    }

    /// List all users in insertion order.
    pub fn list(conn: &Connection) -> Result<Vec<UserRecord>> {
        let mut stmt = conn
            .prepare("SELECT id, name, email, role, created_at FROM users ORDER BY created_at, id")
            .context("Failed to prepare users query")?;

        let rows = stmt
            .query_map([], Self::map_row)
            .context("Failed to list users")?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }

        Ok(users)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRecord> {
        Ok(UserRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            role: row.get(3)?,
            created_at: row.get(4)?,
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

    #[test]
    fn test_insert_and_get() {
        let conn = setup_db();
        UserRepository::insert(&conn, "u1", "Ada", Some("ada@example.com"), UserRole::Candidate)
            .unwrap();

        let user = UserRepository::get(&conn, "u1").unwrap().unwrap();
        assert_eq!(user.name, "Ada");
        assert_eq!(user.role, "candidate");
        assert_eq!(user.email, Some("ada@example.com".to_string()));
    }

    #[test]
    fn test_get_unknown_user() {
        let conn = setup_db();
        assert!(UserRepository::get(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let conn = setup_db();
        UserRepository::insert(&conn, "u1", "Ada", None, UserRole::Candidate).unwrap();
        assert!(UserRepository::insert(&conn, "u1", "Grace", None, UserRole::Interviewer).is_err());
    }

    #[test]
    fn test_list_users() {
        let conn = setup_db();
        UserRepository::insert(&conn, "u1", "Ada", None, UserRole::Candidate).unwrap();
        UserRepository::insert(&conn, "u2", "Grace", None, UserRole::Interviewer).unwrap();

        let users = UserRepository::list(&conn).unwrap();
        assert_eq!(users.len(), 2);
    }

    #[test]
    fn test_role_round_trip() {
        assert_eq!(UserRole::from_str("candidate").unwrap(), UserRole::Candidate);
        assert_eq!(
            UserRole::from_str("interviewer").unwrap(),
            UserRole::Interviewer
        );
        assert!(UserRole::from_str("admin").is_err());
    }
}
