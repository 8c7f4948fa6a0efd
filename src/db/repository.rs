use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{Category, Content};

use super::schema::SCHEMA;

const CONTENT_COLUMNS: &str = "c.id, c.url, c.title, c.summary, c.full_content, c.created_at";

/// Handle to the knowledge database. Cloning shares the same connection thread.
#[derive(Clone)]
pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Category operations

    /// Returns the id of the category with this name, creating it if needed.
    /// An existing row keeps its original description.
    pub async fn add_category(&self, name: &str, description: &str) -> Result<i64> {
        let name = name.to_string();
        let description = description.to_string();
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO categories (name, description) VALUES (?1, ?2)
                     ON CONFLICT(name) DO NOTHING",
                    params![name, description],
                )?;
                let id = conn.query_row(
                    "SELECT id FROM categories WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(id)
            })
            .await?;
        Ok(id)
    }

    pub async fn get_categories(&self) -> Result<Vec<Category>> {
        let categories = self
            .conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, name, description, created_at, updated_at FROM categories ORDER BY name",
                )?;
                let categories = stmt
                    .query_map([], category_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(categories)
            })
            .await?;
        Ok(categories)
    }

    pub async fn get_categories_for_content(&self, content_id: i64) -> Result<Vec<Category>> {
        let categories = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT k.id, k.name, k.description, k.created_at, k.updated_at
                       FROM categories k
                       JOIN content_categories cc ON k.id = cc.category_id
                       WHERE cc.content_id = ?1
                       ORDER BY k.name"#,
                )?;
                let categories = stmt
                    .query_map(params![content_id], category_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(categories)
            })
            .await?;
        Ok(categories)
    }

    // Content operations

    pub async fn add_content(
        &self,
        url: &str,
        title: &str,
        summary: &str,
        full_text: &str,
    ) -> Result<i64> {
        let (url, title, summary, full_text) = (
            url.to_string(),
            title.to_string(),
            summary.to_string(),
            full_text.to_string(),
        );
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO content (url, title, summary, full_content) VALUES (?1, ?2, ?3, ?4)",
                    params![url, title, summary, full_text],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    pub async fn get_content(&self, id: i64) -> Result<Option<Content>> {
        let content = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {CONTENT_COLUMNS} FROM content c WHERE c.id = ?1"
                ))?;
                let content = stmt
                    .query_row(params![id], content_from_row)
                    .optional()?;
                Ok(content)
            })
            .await?;
        Ok(content)
    }

    /// Links are idempotent; both rows must already exist.
    pub async fn link_content_to_category(&self, content_id: i64, category_id: i64) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT OR IGNORE INTO content_categories (content_id, category_id) VALUES (?1, ?2)",
                    params![content_id, category_id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn get_content_by_category(&self, category_id: i64) -> Result<Vec<Content>> {
        let content = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    r#"SELECT {CONTENT_COLUMNS}
                       FROM content c
                       JOIN content_categories cc ON c.id = cc.content_id
                       WHERE cc.category_id = ?1
                       ORDER BY c.created_at DESC, c.id DESC"#
                ))?;
                let content = stmt
                    .query_map(params![category_id], content_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(content)
            })
            .await?;
        Ok(content)
    }

    /// Substring match on title or summary. SQLite LIKE folds ASCII case.
    pub async fn search_content(&self, query: &str) -> Result<Vec<Content>> {
        let pattern = format!("%{}%", query);
        let content = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    r#"SELECT {CONTENT_COLUMNS}
                       FROM content c
                       WHERE c.title LIKE ?1 OR c.summary LIKE ?1
                       ORDER BY c.created_at DESC, c.id DESC"#
                ))?;
                let content = stmt
                    .query_map(params![pattern], content_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(content)
            })
            .await?;
        Ok(content)
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // SQLite CURRENT_TIMESTAMP format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn timestamp(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    Ok(row
        .get::<_, String>(idx)
        .ok()
        .and_then(|s| parse_datetime(&s))
        .unwrap_or_else(Utc::now))
}

fn category_from_row(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: timestamp(row, 3)?,
        updated_at: timestamp(row, 4)?,
    })
}

fn content_from_row(row: &Row) -> rusqlite::Result<Content> {
    Ok(Content {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        summary: row.get(3)?,
        full_text: row.get(4)?,
        created_at: timestamp(row, 5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_repo() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("knowledge.db");
        let repo = Repository::new(path.to_str().unwrap()).await.unwrap();
        (dir, repo)
    }

    async fn link_rows(repo: &Repository) -> i64 {
        repo.conn
            .call(|conn| {
                let count = conn.query_row("SELECT COUNT(*) FROM content_categories", [], |row| {
                    row.get(0)
                })?;
                Ok(count)
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn add_category_reuses_existing_row() {
        let (_dir, repo) = open_repo().await;

        let first = repo.add_category("Rust", "systems language").await.unwrap();
        let second = repo.add_category("Rust", "something else").await.unwrap();
        assert_eq!(first, second);

        let categories = repo.get_categories().await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].description, "systems language");
    }

    #[tokio::test]
    async fn category_names_are_case_sensitive() {
        let (_dir, repo) = open_repo().await;

        let lower = repo.add_category("rust", "").await.unwrap();
        let upper = repo.add_category("Rust", "").await.unwrap();
        assert_ne!(lower, upper);
    }

    #[tokio::test]
    async fn categories_are_alphabetical() {
        let (_dir, repo) = open_repo().await;
        for name in ["Science", "Art", "Music"] {
            repo.add_category(name, "").await.unwrap();
        }

        let names: Vec<String> = repo
            .get_categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Art", "Music", "Science"]);
    }

    #[tokio::test]
    async fn add_content_always_inserts() {
        let (_dir, repo) = open_repo().await;

        let a = repo.add_content("https://a", "A", "s", "text").await.unwrap();
        let b = repo.add_content("https://a", "A", "s", "text").await.unwrap();
        assert_ne!(a, b);

        let stored = repo.get_content(a).await.unwrap().unwrap();
        assert_eq!(stored.url, "https://a");
        assert_eq!(stored.full_text, "text");
        assert!(repo.get_content(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn link_is_idempotent() {
        let (_dir, repo) = open_repo().await;
        let content_id = repo.add_content("https://a", "A", "s", "t").await.unwrap();
        let category_id = repo.add_category("Tech", "").await.unwrap();

        repo.link_content_to_category(content_id, category_id).await.unwrap();
        repo.link_content_to_category(content_id, category_id).await.unwrap();

        assert_eq!(link_rows(&repo).await, 1);
        assert_eq!(repo.get_content_by_category(category_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn link_to_missing_rows_is_rejected() {
        let (_dir, repo) = open_repo().await;
        let category_id = repo.add_category("Tech", "").await.unwrap();

        let result = repo.link_content_to_category(42, category_id).await;
        assert!(result.is_err());
        assert_eq!(link_rows(&repo).await, 0);
    }

    #[tokio::test]
    async fn content_by_category_is_newest_first() {
        let (_dir, repo) = open_repo().await;
        let tech = repo.add_category("Tech", "").await.unwrap();
        let other = repo.add_category("Other", "").await.unwrap();

        let older = repo.add_content("https://1", "First", "", "").await.unwrap();
        let newer = repo.add_content("https://2", "Second", "", "").await.unwrap();
        let unrelated = repo.add_content("https://3", "Third", "", "").await.unwrap();
        repo.link_content_to_category(older, tech).await.unwrap();
        repo.link_content_to_category(newer, tech).await.unwrap();
        repo.link_content_to_category(unrelated, other).await.unwrap();

        let ids: Vec<i64> = repo
            .get_content_by_category(tech)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![newer, older]);

        let linked = repo.get_categories_for_content(unrelated).await.unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].name, "Other");
    }

    #[tokio::test]
    async fn search_matches_title_or_summary() {
        let (_dir, repo) = open_repo().await;
        repo.add_content("https://1", "Category theory", "maths", "").await.unwrap();
        repo.add_content("https://2", "Pets", "the cat sat", "").await.unwrap();
        repo.add_content("https://3", "dog", "bark", "").await.unwrap();

        let titles: Vec<String> = repo
            .search_content("cat")
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, vec!["Pets", "Category theory"]);
    }

    #[test]
    fn parses_sqlite_and_rfc3339_timestamps() {
        assert!(parse_datetime("2026-01-11 12:34:56").is_some());
        assert!(parse_datetime("2026-01-11T12:34:56+00:00").is_some());
        assert!(parse_datetime("yesterday").is_none());
    }
}
