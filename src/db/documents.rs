//! Code document persistence.
//!
//! One logical document per meeting holding the shared code buffer, the
//! selected language, and the last execution output. Follows the same
//! pattern as the other repositories: raw SQL with rusqlite, no ORM.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::languages::DEFAULT_LANGUAGE;

/// A code document row.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub id: i64,
    pub meeting_id: String,
    pub code: String,
    pub language: String,
    pub output: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Repository for per-meeting code documents.
///
/// Write operations use a lookup-then-patch-or-insert upsert. The two steps
/// are not atomic: concurrent first-writes for a brand-new meeting can
/// create duplicate rows. Reads resolve to the first row by insertion order.
pub struct DocumentRepository;

impl DocumentRepository {
    /// Find the document for a meeting, if any.
    pub fn find(conn: &Connection, meeting_id: &str) -> Result<Option<DocumentRecord>> {
        conn.query_row(
            "SELECT id, meeting_id, code, language, output, created_at, updated_at
             FROM code_documents WHERE meeting_id = ?1 ORDER BY id LIMIT 1",
            params![meeting_id],
            |row| {
                Ok(DocumentRecord {
                    id: row.get(0)?,
                    meeting_id: row.get(1)?,
                    code: row.get(2)?,
                    language: row.get(3)?,
                    output: row.get(4)?,
                    created_at: row.get(5)?,
                    updated_at: row.get(6)?,
                })
            },
        )
        .optional()
        .context("Failed to query code document")
    }

    /// Current code buffer, or empty if the document does not exist.
    pub fn get_code(conn: &Connection, meeting_id: &str) -> Result<String> {
        Ok(Self::find(conn, meeting_id)?
            .map(|doc| doc.code)
            .unwrap_or_default())
    }

    /// Last execution output, or empty if the document does not exist.
    pub fn get_output(conn: &Connection, meeting_id: &str) -> Result<String> {
        Ok(Self::find(conn, meeting_id)?
            .map(|doc| doc.output)
            .unwrap_or_default())
    }

    /// Selected language. An absent document and an empty stored value both
    /// read as the default language.
    pub fn get_language(conn: &Connection, meeting_id: &str) -> Result<String> {
        let language = Self::find(conn, meeting_id)?
            .map(|doc| doc.language)
            .unwrap_or_default();
        if language.is_empty() {
            Ok(DEFAULT_LANGUAGE.to_string())
        } else {
            Ok(language)
        }
    }

    /// Write the code buffer. Also stamps the language, keeping it
    /// consistent with the buffer that produced it.
    pub fn update_code(
        conn: &Connection,
        meeting_id: &str,
        code: &str,
        language: &str,
    ) -> Result<()> {
        match Self::find(conn, meeting_id)? {
            Some(doc) => {
                conn.execute(
                    "UPDATE code_documents SET code = ?1, language = ?2,
                     updated_at = CURRENT_TIMESTAMP WHERE id = ?3",
                    params![code, language, doc.id],
                )
                .context("Failed to update code")?;
            }
            None => {
                conn.execute(
                    "INSERT INTO code_documents (meeting_id, code, language)
                     VALUES (?1, ?2, ?3)",
                    params![meeting_id, code, language],
                )
                .context("Failed to insert code document")?;
            }
        }
        Ok(())
    }

    /// Write the execution output.
    pub fn update_output(conn: &Connection, meeting_id: &str, output: &str) -> Result<()> {
        match Self::find(conn, meeting_id)? {
            Some(doc) => {
                conn.execute(
                    "UPDATE code_documents SET output = ?1,
                     updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
                    params![output, doc.id],
                )
                .context("Failed to update output")?;
            }
            None => {
                conn.execute(
                    "INSERT INTO code_documents (meeting_id, code, language, output)
                     VALUES (?1, '', '', ?2)",
                    params![meeting_id, output],
                )
                .context("Failed to insert code document")?;
            }
        }
        Ok(())
    }

    /// Write the selected language. The value is stored verbatim; only
    /// clients constrain it to the supported set.
    pub fn update_language(conn: &Connection, meeting_id: &str, language: &str) -> Result<()> {
        match Self::find(conn, meeting_id)? {
            Some(doc) => {
                conn.execute(
                    "UPDATE code_documents SET language = ?1,
                     updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
                    params![language, doc.id],
                )
                .context("Failed to update language")?;
            }
            None => {
                conn.execute(
                    "INSERT INTO code_documents (meeting_id, code, language)
                     VALUES (?1, '', ?2)",
                    params![meeting_id, language],
                )
                .context("Failed to insert code document")?;
            }
        }
        Ok(())
    }
}
