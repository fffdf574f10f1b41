//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::site::{NewSite, Site, SiteVersion};
use crate::state::SiteStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const SITE_COLUMNS: &str = "id, name, url, last_crawled_at, status";
const VERSION_COLUMNS: &str = "id, site_id, body, status_code, checksum, created_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn find_site_by_url(&self, url: &str) -> StorageResult<Option<Site>> {
        let sql = format!("SELECT {} FROM sites WHERE url = ?1", SITE_COLUMNS);
        let site = self
            .conn
            .query_row(&sql, params![url], site_from_row)
            .optional()?;
        Ok(site)
    }

    fn count(&self, sql: &str, params: impl rusqlite::Params) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, params, |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

impl Storage for SqliteStorage {
    // ===== Site Management =====

    fn insert_site(&mut self, site: &NewSite) -> StorageResult<Site> {
        site.validate().map_err(StorageError::Validation)?;

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO sites (name, url, status, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                site.name,
                site.url,
                SiteStatus::initial().to_db_string(),
                now
            ],
        )?;

        self.load_site(self.conn.last_insert_rowid())
    }

    fn upsert_site(&mut self, site: &NewSite) -> StorageResult<Site> {
        site.validate().map_err(StorageError::Validation)?;

        match self.find_site_by_url(&site.url)? {
            Some(existing) => {
                if existing.name != site.name {
                    self.conn.execute(
                        "UPDATE sites SET name = ?1 WHERE id = ?2",
                        params![site.name, existing.id],
                    )?;
                }
                self.load_site(existing.id)
            }
            None => self.insert_site(site),
        }
    }

    fn load_site(&self, site_id: i64) -> StorageResult<Site> {
        let sql = format!("SELECT {} FROM sites WHERE id = ?1", SITE_COLUMNS);
        self.conn
            .query_row(&sql, params![site_id], site_from_row)
            .optional()?
            .ok_or(StorageError::SiteNotFound(site_id))
    }

    fn list_sites(&self, limit: u32, offset: u32) -> StorageResult<Vec<Site>> {
        let sql = format!(
            "SELECT {} FROM sites ORDER BY id LIMIT ?1 OFFSET ?2",
            SITE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let sites = stmt
            .query_map(params![limit, offset], site_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sites)
    }

    fn list_site_ids(&self) -> StorageResult<Vec<i64>> {
        let mut stmt = self.conn.prepare("SELECT id FROM sites ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    fn sites_in_status(&self, status: SiteStatus) -> StorageResult<Vec<Site>> {
        let sql = format!(
            "SELECT {} FROM sites WHERE status = ?1 ORDER BY id",
            SITE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let sites = stmt
            .query_map(params![status.to_db_string()], site_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(sites)
    }

    fn delete_site(&mut self, site_id: i64) -> StorageResult<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM sites WHERE id = ?1", params![site_id])?;
        if deleted == 0 {
            return Err(StorageError::SiteNotFound(site_id));
        }
        Ok(())
    }

    fn update_site_status(&mut self, site_id: i64, status: SiteStatus) -> StorageResult<()> {
        set_status(&self.conn, site_id, status)
    }

    fn update_last_crawled_at(&mut self, site_id: i64, at: DateTime<Utc>) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE sites SET last_crawled_at = ?1 WHERE id = ?2",
            params![at.to_rfc3339(), site_id],
        )?;
        if updated == 0 {
            return Err(StorageError::SiteNotFound(site_id));
        }
        Ok(())
    }

    // ===== Version History =====

    fn load_last_version(&self, site_id: i64) -> StorageResult<Option<SiteVersion>> {
        let sql = format!(
            "SELECT {} FROM site_versions WHERE site_id = ?1 ORDER BY id DESC LIMIT 1",
            VERSION_COLUMNS
        );
        let version = self
            .conn
            .query_row(&sql, params![site_id], version_from_row)
            .optional()?;
        Ok(version)
    }

    fn append_version(
        &mut self,
        site_id: i64,
        body: &str,
        status_code: u16,
        checksum: &str,
    ) -> StorageResult<SiteVersion> {
        insert_version(&self.conn, site_id, body, status_code, checksum)
    }

    fn append_version_with_status(
        &mut self,
        site_id: i64,
        body: &str,
        status_code: u16,
        checksum: &str,
        status: SiteStatus,
    ) -> StorageResult<SiteVersion> {
        // Dropping the transaction without commit rolls the insert back
        let tx = self.conn.transaction()?;
        let version = insert_version(&tx, site_id, body, status_code, checksum)?;
        set_status(&tx, site_id, status)?;
        tx.commit()?;
        Ok(version)
    }

    fn list_versions(&self, site_id: i64) -> StorageResult<Vec<SiteVersion>> {
        let sql = format!(
            "SELECT {} FROM site_versions WHERE site_id = ?1 ORDER BY id",
            VERSION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let versions = stmt
            .query_map(params![site_id], version_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(versions)
    }

    fn count_versions(&self, site_id: i64) -> StorageResult<u64> {
        self.count(
            "SELECT COUNT(*) FROM site_versions WHERE site_id = ?1",
            params![site_id],
        )
    }

    fn version_number(&self, site_id: i64, version_id: Option<i64>) -> StorageResult<u64> {
        match version_id {
            Some(id) => self.count(
                "SELECT COUNT(*) FROM site_versions WHERE site_id = ?1 AND id <= ?2",
                params![site_id, id],
            ),
            None => Ok(0),
        }
    }

    // ===== Statistics =====

    fn count_sites_by_status(&self, status: SiteStatus) -> StorageResult<u64> {
        self.count(
            "SELECT COUNT(*) FROM sites WHERE status = ?1",
            params![status.to_db_string()],
        )
    }

    fn count_total_sites(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM sites", [])
    }

    fn count_total_versions(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM site_versions", [])
    }
}

fn set_status(conn: &Connection, site_id: i64, status: SiteStatus) -> StorageResult<()> {
    let updated = conn.execute(
        "UPDATE sites SET status = ?1 WHERE id = ?2",
        params![status.to_db_string(), site_id],
    )?;
    if updated == 0 {
        return Err(StorageError::SiteNotFound(site_id));
    }
    Ok(())
}

fn insert_version(
    conn: &Connection,
    site_id: i64,
    body: &str,
    status_code: u16,
    checksum: &str,
) -> StorageResult<SiteVersion> {
    let created_at = Utc::now();
    conn.execute(
        "INSERT INTO site_versions (site_id, body, status_code, checksum, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![site_id, body, status_code, checksum, created_at.to_rfc3339()],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StorageError::SiteNotFound(site_id)
        }
        other => StorageError::Sqlite(other),
    })?;

    Ok(SiteVersion {
        id: conn.last_insert_rowid(),
        site_id,
        body: body.to_string(),
        status_code,
        checksum: checksum.to_string(),
        created_at,
    })
}

fn site_from_row(row: &Row<'_>) -> rusqlite::Result<Site> {
    let last_crawled_at: Option<String> = row.get(3)?;
    let status: String = row.get(4)?;

    Ok(Site {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        last_crawled_at: last_crawled_at
            .map(|s| parse_timestamp(3, &s))
            .transpose()?,
        status: SiteStatus::from_db_string(&status).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                Type::Text,
                format!("unknown site status '{}'", status).into(),
            )
        })?,
    })
}

fn version_from_row(row: &Row<'_>) -> rusqlite::Result<SiteVersion> {
    let created_at: String = row.get(5)?;

    Ok(SiteVersion {
        id: row.get(0)?,
        site_id: row.get(1)?,
        body: row.get(2)?,
        status_code: row.get(3)?,
        checksum: row.get(4)?,
        created_at: parse_timestamp(5, &created_at)?,
    })
}

fn parse_timestamp(column: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}
