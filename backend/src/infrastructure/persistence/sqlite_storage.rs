use crate::application::repositories::Storage;
use crate::domain::content::Fields;
use crate::domain::value_objects::{LanguageCode, PageId, VersionId};
use crate::domain::DomainResult;
use crate::infrastructure::storage::{StorageError, StorageResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::fmt;
use std::rc::Rc;

/// Content slots of one page stored as JSON rows in the `content` table
#[derive(Clone)]
pub struct SqliteStorage {
    conn: Rc<Connection>,
    page_id: PageId,
}

impl SqliteStorage {
    pub fn new(conn: Rc<Connection>, page_id: PageId) -> Self {
        SqliteStorage { conn, page_id }
    }

    fn read_row(&self, version: VersionId, language: &LanguageCode) -> StorageResult<Fields> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT fields FROM content WHERE page_id = ?1 AND version = ?2 AND language = ?3",
                params![self.page_id.as_str(), version.as_str(), language.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Fields::new()),
        }
    }

    fn write_row(&self, version: VersionId, language: &LanguageCode, fields: &Fields) -> StorageResult<()> {
        let json = serde_json::to_string(fields)?;
        self.conn.execute(
            "INSERT INTO content (page_id, version, language, fields) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (page_id, version, language) DO UPDATE SET fields = excluded.fields",
            params![self.page_id.as_str(), version.as_str(), language.as_str(), json],
        )?;
        Ok(())
    }

    fn count_rows(&self, version: VersionId, language: &LanguageCode) -> StorageResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM content WHERE page_id = ?1 AND version = ?2 AND language = ?3",
            params![self.page_id.as_str(), version.as_str(), language.as_str()],
            |row| row.get(0),
        )?)
    }

    fn delete_row(&self, version: VersionId, language: &LanguageCode) -> StorageResult<()> {
        self.conn.execute(
            "DELETE FROM content WHERE page_id = ?1 AND version = ?2 AND language = ?3",
            params![self.page_id.as_str(), version.as_str(), language.as_str()],
        )?;
        Ok(())
    }

    fn list_rows(&self) -> StorageResult<Vec<(VersionId, LanguageCode)>> {
        let mut stmt = self.conn.prepare(
            "SELECT version, language FROM content WHERE page_id = ?1 ORDER BY version DESC, language",
        )?;
        let rows: Vec<(String, String)> = stmt
            .query_map(params![self.page_id.as_str()], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(version, language)| {
                let version = version
                    .parse::<VersionId>()
                    .map_err(|e| StorageError::Layout(e.to_string()))?;
                let language =
                    LanguageCode::new(language).map_err(|e| StorageError::Layout(e.to_string()))?;
                Ok((version, language))
            })
            .collect()
    }
}

impl fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteStorage")
            .field("page_id", &self.page_id)
            .finish()
    }
}

impl Storage for SqliteStorage {
    fn kind(&self) -> &'static str {
        "sqlite"
    }

    fn read(&self, version: VersionId, language: &LanguageCode) -> DomainResult<Fields> {
        Ok(self.read_row(version, language)?)
    }

    fn write(&self, version: VersionId, language: &LanguageCode, fields: &Fields) -> DomainResult<()> {
        Ok(self.write_row(version, language, fields)?)
    }

    fn exists(&self, version: VersionId, language: &LanguageCode) -> DomainResult<bool> {
        Ok(self.count_rows(version, language)? > 0)
    }

    fn delete(&self, version: VersionId, language: &LanguageCode) -> DomainResult<()> {
        Ok(self.delete_row(version, language)?)
    }

    fn slots(&self) -> DomainResult<Vec<(VersionId, LanguageCode)>> {
        Ok(self.list_rows()?)
    }

    fn boxed_clone(&self) -> Box<dyn Storage> {
        Box::new(self.clone())
    }
}
