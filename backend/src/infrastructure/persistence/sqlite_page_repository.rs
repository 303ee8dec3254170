use super::sqlite_storage::SqliteStorage;
use crate::application::repositories::{CopyOptions, PageRecord, PageRepository, Storage};
use crate::domain::entities::PageFile;
use crate::domain::value_objects::{PageId, Slug, Template};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::storage::{StorageError, StorageResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::rc::Rc;

/// Raw `pages` row: id, slug, num, is_draft, template
type RawRecord = (String, String, Option<i64>, bool, String);

fn raw_record(row: &Row) -> rusqlite::Result<RawRecord> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn to_record((id, slug, num, is_draft, template): RawRecord) -> DomainResult<PageRecord> {
    Ok(PageRecord {
        id: PageId::new(id)?,
        slug: Slug::new(slug)?,
        num,
        is_draft,
        template: Template::new(template)?,
    })
}

fn insert_row(conn: &Connection, record: &PageRecord) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO pages (id, parent, slug, num, is_draft, template)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            record.id.as_str(),
            record.parent_id().as_ref().map(PageId::as_str),
            record.slug.as_str(),
            record.num,
            record.is_draft,
            record.template.as_str(),
        ],
    )?;
    Ok(())
}

/// SQLite-based implementation of the PageRepository trait.
///
/// Content and files hang off `pages.id` with cascading foreign keys, so
/// renaming or deleting a page row carries them along.
pub struct SqlitePageRepository {
    conn: Rc<Connection>,
}

impl SqlitePageRepository {
    /// Create a new SQLite repository with the given connection
    pub fn new(conn: Connection) -> StorageResult<Self> {
        super::schema::initialize_database(&conn)?;
        Ok(SqlitePageRepository { conn: Rc::new(conn) })
    }

    /// Create a new in-memory SQLite repository (useful for testing)
    pub fn new_in_memory() -> StorageResult<Self> {
        Self::new(Connection::open_in_memory()?)
    }

    /// Create a new file-based SQLite repository
    pub fn new_with_path(path: impl AsRef<Path>) -> StorageResult<Self> {
        tracing::info!("Opening page database: {}", path.as_ref().display());
        Self::new(Connection::open(path)?)
    }

    /// Attach a file name to a page
    pub fn add_file(&mut self, record: &PageRecord, filename: &str) -> DomainResult<()> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO files (page_id, filename) VALUES (?1, ?2)",
                params![record.id.as_str(), filename],
            )
            .map_err(StorageError::from)?;
        Ok(())
    }

    fn select_children(&self, parent: Option<&PageId>) -> StorageResult<Vec<RawRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, slug, num, is_draft, template FROM pages WHERE parent IS ?1 ORDER BY rowid",
        )?;
        let rows = stmt
            .query_map(params![parent.map(PageId::as_str)], raw_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn select_one(&self, id: &PageId) -> StorageResult<Option<RawRecord>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, slug, num, is_draft, template FROM pages WHERE id = ?1",
                params![id.as_str()],
                raw_record,
            )
            .optional()?)
    }

    fn ensure_free(&self, id: &PageId) -> DomainResult<()> {
        if self.select_one(id)?.is_some() {
            return Err(DomainError::duplicate(
                "error.page.duplicate",
                format!("A page with the id \"{}\" already exists", id),
            ));
        }
        Ok(())
    }

    fn ensure_exists(&self, id: &PageId) -> DomainResult<()> {
        if self.select_one(id)?.is_none() {
            return Err(DomainError::not_found(
                "error.page.notFound",
                format!("The page \"{}\" cannot be found", id),
            ));
        }
        Ok(())
    }

    fn relocate_rows(&self, from: &PageRecord, to: &PageRecord) -> StorageResult<()> {
        let tx = self.conn.unchecked_transaction()?;

        if from.id != to.id {
            let old = from.id.as_str();
            let new = to.id.as_str();
            let len = old.chars().count() as i64;

            // descendants first keep their parent column in step with the new ids
            tx.execute(
                "UPDATE pages SET parent = ?2 || substr(parent, ?3 + 1)
                 WHERE parent = ?1 OR substr(parent, 1, ?3 + 1) = ?1 || '/'",
                params![old, new, len],
            )?;
            tx.execute(
                "UPDATE pages SET id = ?2 || substr(id, ?3 + 1)
                 WHERE id = ?1 OR substr(id, 1, ?3 + 1) = ?1 || '/'",
                params![old, new, len],
            )?;
        }

        tx.execute(
            "UPDATE pages SET parent = ?2, slug = ?3, num = ?4, is_draft = ?5, template = ?6
             WHERE id = ?1",
            params![
                to.id.as_str(),
                to.parent_id().as_ref().map(PageId::as_str),
                to.slug.as_str(),
                to.num,
                to.is_draft,
                to.template.as_str(),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn delete_rows(&self, id: &PageId) -> StorageResult<()> {
        let len = id.as_str().chars().count() as i64;
        self.conn.execute(
            "DELETE FROM pages WHERE id = ?1 OR substr(id, 1, ?2 + 1) = ?1 || '/'",
            params![id.as_str(), len],
        )?;
        Ok(())
    }

    fn copy_rows(&self, pairs: &[(PageRecord, PageRecord)], files: bool) -> StorageResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        for (source, target) in pairs {
            insert_row(&tx, target)?;
            tx.execute(
                "INSERT INTO content (page_id, version, language, fields)
                 SELECT ?2, version, language, fields FROM content WHERE page_id = ?1",
                params![source.id.as_str(), target.id.as_str()],
            )?;
            if files {
                tx.execute(
                    "INSERT INTO files (page_id, filename)
                     SELECT ?2, filename FROM files WHERE page_id = ?1",
                    params![source.id.as_str(), target.id.as_str()],
                )?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn select_files(&self, id: &PageId) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT filename FROM files WHERE page_id = ?1 ORDER BY filename")?;
        let names = stmt
            .query_map(params![id.as_str()], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }
}

impl PageRepository for SqlitePageRepository {
    fn kind(&self) -> &'static str {
        "sqlite"
    }

    fn children_of(&self, parent: Option<&PageId>) -> DomainResult<Vec<PageRecord>> {
        self.select_children(parent)?.into_iter().map(to_record).collect()
    }

    fn find(&self, id: &PageId) -> DomainResult<Option<PageRecord>> {
        self.select_one(id)?.map(to_record).transpose()
    }

    fn insert(&mut self, record: &PageRecord) -> DomainResult<()> {
        self.ensure_free(&record.id)?;
        insert_row(&self.conn, record).map_err(StorageError::from)?;
        Ok(())
    }

    fn relocate(&mut self, from: &PageRecord, to: &PageRecord) -> DomainResult<()> {
        self.ensure_exists(&from.id)?;
        if from.id != to.id {
            self.ensure_free(&to.id)?;
        }
        Ok(self.relocate_rows(from, to)?)
    }

    fn remove(&mut self, record: &PageRecord) -> DomainResult<()> {
        self.ensure_exists(&record.id)?;
        Ok(self.delete_rows(&record.id)?)
    }

    fn copy(&mut self, from: &PageRecord, to: &PageRecord, options: CopyOptions) -> DomainResult<()> {
        self.ensure_exists(&from.id)?;
        self.ensure_free(&to.id)?;

        let mut pairs = vec![(from.clone(), to.clone())];
        if options.children {
            for descendant in self.descendants_of(&from.id)? {
                if let Some(id) = descendant.id.rebase(&from.id, &to.id) {
                    let target = PageRecord { id, ..descendant.clone() };
                    pairs.push((descendant, target));
                }
            }
        }

        Ok(self.copy_rows(&pairs, options.files)?)
    }

    fn files(&self, record: &PageRecord) -> DomainResult<Vec<PageFile>> {
        Ok(self
            .select_files(&record.id)?
            .into_iter()
            .map(|name| PageFile::new(record.id.clone(), name))
            .collect())
    }

    fn storage(&self, record: &PageRecord) -> DomainResult<Box<dyn Storage>> {
        Ok(Box::new(SqliteStorage::new(self.conn.clone(), record.id.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::fields_from;
    use crate::domain::value_objects::{LanguageCode, VersionId};

    fn record(parent: Option<&str>, slug: &str, num: Option<i64>, is_draft: bool) -> PageRecord {
        let parent = parent.map(|id| PageId::new(id).unwrap());
        PageRecord::new(
            parent.as_ref(),
            Slug::new(slug).unwrap(),
            num,
            is_draft,
            Template::default(),
        )
        .unwrap()
    }

    fn seeded() -> SqlitePageRepository {
        let mut repo = SqlitePageRepository::new_in_memory().unwrap();
        let blog = record(None, "blog", Some(1), false);
        repo.insert(&blog).unwrap();
        repo.insert(&record(Some("blog"), "a", Some(1), false)).unwrap();
        repo.insert(&record(Some("blog"), "b", None, true)).unwrap();

        repo.storage(&blog)
            .unwrap()
            .write(
                VersionId::Latest,
                &LanguageCode::single(),
                &fields_from([("title", "Blog")]),
            )
            .unwrap();
        repo.add_file(&record(Some("blog"), "a", Some(1), false), "cover.jpg")
            .unwrap();
        repo
    }

    fn title(repo: &SqlitePageRepository, record: &PageRecord) -> Option<String> {
        repo.storage(record)
            .unwrap()
            .read(VersionId::Latest, &LanguageCode::single())
            .unwrap()
            .get("title")
            .cloned()
    }

    #[test]
    fn test_insert_and_find() {
        let repo = seeded();
        let blog = repo.find(&PageId::new("blog").unwrap()).unwrap().unwrap();
        assert_eq!(blog.num, Some(1));
        assert_eq!(title(&repo, &blog).as_deref(), Some("Blog"));

        let children = repo.children_of(Some(&blog.id)).unwrap();
        assert_eq!(children.len(), 2);
        assert!(children[1].is_draft);
        assert_eq!(repo.children_of(None).unwrap().len(), 1);
    }

    #[test]
    fn test_insert_duplicate() {
        let mut repo = seeded();
        let err = repo.insert(&record(None, "blog", None, false)).unwrap_err();
        assert_eq!(err.key(), "error.page.duplicate");
    }

    #[test]
    fn test_relocate_carries_subtree_content_and_files() {
        let mut repo = seeded();
        let blog = record(None, "blog", Some(1), false);
        let journal = blog.with_slug(Slug::new("journal").unwrap()).with_num(Some(2));

        repo.relocate(&blog, &journal).unwrap();

        assert!(repo.find(&blog.id).unwrap().is_none());
        let found = repo.find(&journal.id).unwrap().unwrap();
        assert_eq!(found.num, Some(2));
        assert_eq!(title(&repo, &journal).as_deref(), Some("Blog"));

        let children = repo.children_of(Some(&journal.id)).unwrap();
        assert_eq!(children[0].id.as_str(), "journal/a");
        assert_eq!(repo.files(&children[0]).unwrap()[0].id(), "journal/a/cover.jpg");
    }

    #[test]
    fn test_remove_cascades() {
        let mut repo = seeded();
        let blog = record(None, "blog", Some(1), false);
        repo.remove(&blog).unwrap();

        assert!(repo.children_of(None).unwrap().is_empty());
        assert!(repo.find(&PageId::new("blog/a").unwrap()).unwrap().is_none());
        assert!(title(&repo, &blog).is_none());
    }

    #[test]
    fn test_copy_with_children() {
        let mut repo = seeded();
        let blog = record(None, "blog", Some(1), false);
        let copy = record(None, "blog-copy", None, true);

        repo.copy(&blog, &copy, CopyOptions { children: true, files: true }).unwrap();

        assert_eq!(title(&repo, &copy).as_deref(), Some("Blog"));
        let children = repo.children_of(Some(&copy.id)).unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(repo.files(&children[0]).unwrap().len(), 1);
    }
}
