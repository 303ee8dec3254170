use rusqlite::{Connection, Result};

/// Initialize the SQLite database with the required schema.
/// This function is idempotent and can be safely called multiple times.
pub fn initialize_database(conn: &Connection) -> Result<()> {
    // Content and file rows follow their page through renames and deletes
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    // Structural inventory; rowid is the repository order
    conn.execute(
        "CREATE TABLE IF NOT EXISTS pages (
            id TEXT PRIMARY KEY,
            parent TEXT,
            slug TEXT NOT NULL,
            num INTEGER,
            is_draft INTEGER NOT NULL,
            template TEXT NOT NULL,
            CHECK (is_draft = 0 OR num IS NULL)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_pages_parent ON pages(parent)",
        [],
    )?;

    // One row per (version, language) slot, fields as a JSON object
    conn.execute(
        "CREATE TABLE IF NOT EXISTS content (
            page_id TEXT NOT NULL,
            version TEXT NOT NULL,
            language TEXT NOT NULL,
            fields TEXT NOT NULL,
            PRIMARY KEY (page_id, version, language),
            FOREIGN KEY (page_id) REFERENCES pages(id) ON DELETE CASCADE ON UPDATE CASCADE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS files (
            page_id TEXT NOT NULL,
            filename TEXT NOT NULL,
            PRIMARY KEY (page_id, filename),
            FOREIGN KEY (page_id) REFERENCES pages(id) ON DELETE CASCADE ON UPDATE CASCADE
        )",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<String>>>()
            .unwrap()
    }

    #[test]
    fn test_initialize_database() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_database(&conn).unwrap();

        let tables = tables(&conn);
        assert!(tables.contains(&"pages".to_string()));
        assert!(tables.contains(&"content".to_string()));
        assert!(tables.contains(&"files".to_string()));

        let foreign_keys: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(foreign_keys, 1);
    }

    #[test]
    fn test_initialize_database_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize_database(&conn).unwrap();
        initialize_database(&conn).unwrap();
        initialize_database(&conn).unwrap();

        assert_eq!(tables(&conn).len(), 3);
    }

    #[test]
    fn test_draft_with_num_violates_check() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_database(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO pages (id, parent, slug, num, is_draft, template)
             VALUES ('a', NULL, 'a', 1, 1, 'default')",
            [],
        );
        assert!(result.is_err());
    }
}
