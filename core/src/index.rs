// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::borrow::Cow;
use std::path::Path;

use jiff::Timestamp;
use sqlx::query::QueryAs;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, SqliteConnection};

use crate::query::{Bind, CompiledQuery};
use crate::{Error, Event, Field, Pager, SearchRequest};

/// Full-text index of events, stored in SQLite and searched through FTS5.
#[derive(Debug, Clone)]
pub struct EventIndex {
    pool: SqlitePool,
}

impl EventIndex {
    /// Opens the index stored at `path`, creating it if missing.
    /// If `path` is `None`, it opens an in-memory index.
    pub async fn open_or_create(path: Option<&Path>) -> Result<Self, Error> {
        let (options, pool_options) = if let Some(path) = path {
            tracing::info!(path = %path.display(), "opening search index");
            if let Some(parent) = path.parent().filter(|a| !a.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| Error::Open {
                        path: parent.to_owned(),
                        source,
                    })?;
            }

            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true);
            (options, SqlitePoolOptions::new())
        } else {
            tracing::info!("opening in-memory search index");
            // the database lives as long as its only connection
            let pool_options = SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
            (SqliteConnectOptions::new().in_memory(true), pool_options)
        };

        let pool = pool_options.connect_with(options).await?;
        sqlx::migrate!("src/index/migrations") // relative path from the crate root
            .run(&pool)
            .await?;

        Ok(Self { pool })
    }

    /// Adds or replaces events, keyed by UID, in a single transaction.
    ///
    /// Events without a UID cannot be addressed and are skipped. Returns the number of
    /// events written.
    pub async fn add_batch(&self, events: &[Event]) -> Result<u64, Error> {
        let mut tx = self.pool.begin().await?;
        let mut count = 0;
        for event in events {
            if event.uid.is_empty() {
                tracing::warn!(summary = %event.summary, "skipping event without UID");
                continue;
            }
            upsert(&mut *tx, event).await?;
            count += 1;
        }
        tx.commit().await?;

        tracing::debug!(count, "indexed batch");
        Ok(count)
    }

    /// Looks up one event by UID.
    pub async fn get(&self, uid: &str) -> Result<Option<Event>, Error> {
        const SQL: &str = "\
SELECT uid, summary, description, speaker, location, category, url, start, duration
FROM events
WHERE uid = ?;
";

        let row: Option<EventRow> = sqlx::query_as(SQL)
            .bind(uid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// The number of indexed events.
    pub async fn count(&self) -> Result<i64, Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events;")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    /// Removes every event from the index.
    pub async fn clear(&self) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM events_fts;")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM events;").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Runs a search, returning the total number of matches and the requested page.
    ///
    /// Full-text matches are ranked by FTS5's `bm25`, other queries are ordered by start time.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResult, Error> {
        let compiled = request.query.compile()?;
        let match_expr = compiled.match_expr();
        tracing::debug!(?match_expr, filters = compiled.filters.len(), "searching");

        let statements = SearchSql::build(&compiled, match_expr.is_some(), request.highlight);

        let mut count = sqlx::query_as(&statements.count);
        count = bind_query(count, match_expr.as_deref(), &compiled);
        let (total,): (i64,) = count
            .fetch_one(&self.pool)
            .await
            .map_err(query_error)?;

        let mut select = sqlx::query_as(&statements.select);
        select = bind_query(select, match_expr.as_deref(), &compiled);
        let rows: Vec<HitRow> = select
            .bind(request.pager.limit)
            .bind(request.pager.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;

        Ok(SearchResult {
            total,
            fields: request.fields.clone(),
            pager: request.pager,
            hits: rows.into_iter().map(Into::into).collect(),
        })
    }

    pub async fn close(self) -> Result<(), Error> {
        tracing::debug!("closing search index");
        self.pool.close().await;
        Ok(())
    }
}

async fn upsert(conn: &mut SqliteConnection, event: &Event) -> Result<(), sqlx::Error> {
    const UPSERT: &str = "\
INSERT INTO events (uid, summary, description, speaker, location, category, url, start, duration)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
ON CONFLICT(uid) DO UPDATE SET
    summary     = excluded.summary,
    description = excluded.description,
    speaker     = excluded.speaker,
    location    = excluded.location,
    category    = excluded.category,
    url         = excluded.url,
    start       = excluded.start,
    duration    = excluded.duration
RETURNING id;
";

    let (id,): (i64,) = sqlx::query_as(UPSERT)
        .bind(&event.uid)
        .bind(&event.summary)
        .bind(&event.description)
        .bind(&event.speaker)
        .bind(&event.location)
        .bind(&event.category)
        .bind(&event.url)
        .bind(event.start.map(|a| a.as_second()))
        .bind(event.duration)
        .fetch_one(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM events_fts WHERE rowid = ?;")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        "INSERT INTO events_fts (rowid, summary, description, speaker, location) VALUES (?, ?, ?, ?, ?);",
    )
    .bind(id)
    .bind(&event.summary)
    .bind(&event.description)
    .bind(&event.speaker)
    .bind(&event.location)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// The counting and selecting statements of one search.
struct SearchSql {
    count: String,
    select: String,
}

impl SearchSql {
    const COLUMNS: &str = "events.uid, events.summary, events.description, events.speaker, \
events.location, events.category, events.url, events.start, events.duration";

    fn build(compiled: &CompiledQuery, full_text: bool, highlight: bool) -> Self {
        let mut where_clause = String::new();
        for (i, (filter, _)) in compiled.filters.iter().enumerate() {
            where_clause += if i == 0 { " WHERE " } else { " AND " };
            where_clause += filter;
        }

        if !full_text {
            let count = format!("SELECT COUNT(*) FROM events{where_clause};");
            let select = format!(
                "\
SELECT {}, NULL AS score, NULL AS summary_fragment, NULL AS description_fragment
FROM events{where_clause}
ORDER BY events.start IS NULL, events.start, events.uid
LIMIT ? OFFSET ?;",
                Self::COLUMNS
            );
            return Self { count, select };
        }

        // column 0 is summary and column 1 is description, see the migrations
        let fragments = if highlight {
            "highlight(events_fts, 0, '<mark>', '</mark>') AS summary_fragment, \
highlight(events_fts, 1, '<mark>', '</mark>') AS description_fragment"
        } else {
            "NULL AS summary_fragment, NULL AS description_fragment"
        };

        let count = format!(
            "\
WITH hits AS MATERIALIZED (
    SELECT rowid AS id FROM events_fts WHERE events_fts MATCH ?
)
SELECT COUNT(*) FROM hits JOIN events ON events.id = hits.id{where_clause};"
        );
        let select = format!(
            "\
WITH hits AS MATERIALIZED (
    SELECT rowid AS id, -bm25(events_fts) AS score, {fragments}
    FROM events_fts WHERE events_fts MATCH ?
)
SELECT {}, hits.score, hits.summary_fragment, hits.description_fragment
FROM hits JOIN events ON events.id = hits.id{where_clause}
ORDER BY hits.score DESC, events.uid
LIMIT ? OFFSET ?;",
            Self::COLUMNS
        );
        Self { count, select }
    }
}

fn bind_query<'a, O>(
    mut query: QueryAs<'a, Sqlite, O, SqliteArguments<'a>>,
    match_expr: Option<&'a str>,
    compiled: &'a CompiledQuery,
) -> QueryAs<'a, Sqlite, O, SqliteArguments<'a>> {
    if let Some(expr) = match_expr {
        query = query.bind(expr);
    }
    for (_, bind) in &compiled.filters {
        query = match bind {
            Bind::Text(a) => query.bind(a.as_str()),
            Bind::Real(a) => query.bind(*a),
            Bind::Integer(a) => query.bind(*a),
        };
    }
    query
}

/// Reports FTS5 syntax errors and unknown columns as invalid queries.
fn query_error(e: sqlx::Error) -> Error {
    match e {
        sqlx::Error::Database(db)
            if db.message().starts_with("fts5:") || db.message().starts_with("no such column") =>
        {
            Error::InvalidQuery(db.message().to_string())
        }
        e => e.into(),
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Number of events matching the query, across all pages.
    pub total: i64,

    /// Fields requested for display.
    pub fields: Vec<Field>,

    /// The page this result covers.
    pub pager: Pager,

    /// Matching events of this page, best first.
    pub hits: Vec<SearchHit>,
}

/// A matching event.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// The stored event.
    pub event: Event,

    /// Relevance, higher is better; `None` for queries without a full-text part.
    pub score: Option<f64>,

    /// Field values with matched terms wrapped in `<mark>`.
    pub fragments: Vec<(Field, String)>,
}

impl SearchHit {
    /// The highlighted value of a field if there is one, its stored value otherwise.
    pub fn field(&self, field: Field) -> Cow<'_, str> {
        self.fragments
            .iter()
            .find(|(a, _)| *a == field)
            .map(|(_, fragment)| fragment.as_str().into())
            .unwrap_or_else(|| self.event.field(field))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    uid: String,
    summary: String,
    description: String,
    speaker: String,
    location: String,
    category: String,
    url: String,
    start: Option<i64>,
    duration: f64,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            uid: row.uid,
            summary: row.summary,
            description: row.description,
            speaker: row.speaker,
            location: row.location,
            category: row.category,
            url: row.url,
            start: row.start.and_then(|a| Timestamp::from_second(a).ok()),
            duration: row.duration,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct HitRow {
    #[sqlx(flatten)]
    event: EventRow,
    score: Option<f64>,
    summary_fragment: Option<String>,
    description_fragment: Option<String>,
}

impl From<HitRow> for SearchHit {
    fn from(row: HitRow) -> Self {
        let fragments = [
            (Field::Summary, row.summary_fragment),
            (Field::Description, row.description_fragment),
        ]
        .into_iter()
        .filter_map(|(field, fragment)| fragment.map(|a| (field, a)))
        .collect();

        SearchHit {
            event: row.event.into(),
            score: row.score,
            fragments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Query;

    /// Test helper to create an in-memory index
    async fn setup_test_index() -> EventIndex {
        EventIndex::open_or_create(None)
            .await
            .expect("Failed to create test index")
    }

    /// Test helper to create a test event
    fn test_event(uid: &str, summary: &str) -> Event {
        Event {
            uid: uid.to_string(),
            summary: summary.to_string(),
            ..Default::default()
        }
    }

    fn uids(result: &SearchResult) -> Vec<&str> {
        result.hits.iter().map(|a| a.event.uid.as_str()).collect()
    }

    #[tokio::test]
    async fn add_batch_inserts_events() {
        // Arrange
        let index = setup_test_index().await;
        let event = Event {
            description: "Text indexing".to_string(),
            speaker: "Marty Schoch".to_string(),
            location: "K.4.201".to_string(),
            category: "Go".to_string(),
            url: "https://fosdem.org/".to_string(),
            start: Some("2015-02-01T17:30:00Z".parse().unwrap()),
            duration: 25.0,
            ..test_event("event-1", "Bleve")
        };

        // Act
        let count = index.add_batch(&[event.clone()]).await.unwrap();

        // Assert
        assert_eq!(count, 1);
        assert_eq!(index.count().await.unwrap(), 1);
        let retrieved = index.get("event-1").await.unwrap().expect("Event not found");
        assert_eq!(retrieved, event);
    }

    #[tokio::test]
    async fn add_batch_replaces_existing_uid() {
        // Arrange
        let index = setup_test_index().await;
        index
            .add_batch(&[test_event("event-1", "Original summary")])
            .await
            .unwrap();

        // Act
        index
            .add_batch(&[test_event("event-1", "Updated summary")])
            .await
            .unwrap();

        // Assert
        assert_eq!(index.count().await.unwrap(), 1);
        let result = index
            .search(&SearchRequest::new(Query::term("original")))
            .await
            .unwrap();
        assert_eq!(result.total, 0);
        let result = index
            .search(&SearchRequest::new(Query::term("updated")))
            .await
            .unwrap();
        assert_eq!(uids(&result), vec!["event-1"]);
    }

    #[tokio::test]
    async fn add_batch_keeps_one_text_row_per_event() {
        // Arrange
        let index = setup_test_index().await;
        let events = [test_event("event-1", "Bleve"), test_event("event-2", "Go")];
        index.add_batch(&events).await.unwrap();

        // Act
        index
            .add_batch(&[test_event("event-1", "Bleve again")])
            .await
            .unwrap();

        // Assert
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT events.id, events_fts.rowid FROM events \
LEFT JOIN events_fts ON events_fts.rowid = events.id ORDER BY events.uid;",
        )
        .fetch_all(&index.pool)
        .await
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|(id, rowid)| id == rowid));
        let (fts_rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events_fts;")
            .fetch_one(&index.pool)
            .await
            .unwrap();
        assert_eq!(fts_rows, 2);
    }

    #[tokio::test]
    async fn add_batch_skips_events_without_uid() {
        // Arrange
        let index = setup_test_index().await;

        // Act
        let count = index
            .add_batch(&[test_event("", "No uid"), test_event("event-1", "Uid")])
            .await
            .unwrap();

        // Assert
        assert_eq!(count, 1);
        assert_eq!(index.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn get_returns_none_for_missing_uid() {
        let index = setup_test_index().await;
        assert_eq!(index.get("nonexistent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        // Arrange
        let index = setup_test_index().await;
        index
            .add_batch(&[test_event("event-1", "Bleve")])
            .await
            .unwrap();

        // Act
        index.clear().await.unwrap();

        // Assert
        assert_eq!(index.count().await.unwrap(), 0);
        let result = index
            .search(&SearchRequest::new(Query::term("bleve")))
            .await
            .unwrap();
        assert_eq!(result.total, 0);
    }

    #[tokio::test]
    async fn term_search_is_stemmed() {
        // Arrange
        let index = setup_test_index().await;
        index
            .add_batch(&[
                test_event("event-1", "Indexing text"),
                test_event("event-2", "Something else"),
            ])
            .await
            .unwrap();

        // Act
        let result = index
            .search(&SearchRequest::new(Query::term("indexes")))
            .await
            .unwrap();

        // Assert
        assert_eq!(result.total, 1);
        assert_eq!(uids(&result), vec!["event-1"]);
        assert!(result.hits[0].score.is_some());
    }

    #[tokio::test]
    async fn keyword_term_matches_exactly() {
        // Arrange
        let index = setup_test_index().await;
        index
            .add_batch(&[
                Event {
                    category: "Go".to_string(),
                    ..test_event("event-1", "A")
                },
                Event {
                    category: "Go Tools".to_string(),
                    ..test_event("event-2", "B")
                },
            ])
            .await
            .unwrap();

        // Act
        let query = Query::term("Go").in_field(Field::Category);
        let result = index.search(&SearchRequest::new(query)).await.unwrap();

        // Assert
        assert_eq!(uids(&result), vec!["event-1"]);
        assert_eq!(result.hits[0].score, None);
    }

    #[tokio::test]
    async fn search_pages_results() {
        // Arrange
        let index = setup_test_index().await;
        let events: Vec<_> = (0..5)
            .map(|i| test_event(&format!("event-{i}"), "Go talk"))
            .collect();
        index.add_batch(&events).await.unwrap();

        // Act
        let request = SearchRequest::new(Query::term("go")).with_pager((2, 4).into());
        let result = index.search(&request).await.unwrap();

        // Assert
        assert_eq!(result.total, 5);
        assert_eq!(result.hits.len(), 1);
    }

    #[tokio::test]
    async fn highlight_marks_matches() {
        // Arrange
        let index = setup_test_index().await;
        index
            .add_batch(&[Event {
                description: "Text indexing".to_string(),
                ..test_event("event-1", "Bleve")
            }])
            .await
            .unwrap();

        // Act
        let request = SearchRequest::new(Query::term("bleve")).with_highlight(true);
        let result = index.search(&request).await.unwrap();

        // Assert
        let hit = &result.hits[0];
        assert_eq!(hit.field(Field::Summary), "<mark>Bleve</mark>");
        assert_eq!(hit.field(Field::Description), "Text indexing");
        assert_eq!(hit.field(Field::Uid), "event-1");
    }

    #[tokio::test]
    async fn range_search_is_ordered_by_start() {
        // Arrange
        let index = setup_test_index().await;
        index
            .add_batch(&[
                Event {
                    start: Some("2015-02-01T10:00:00Z".parse().unwrap()),
                    duration: 120.0,
                    ..test_event("late", "Late")
                },
                Event {
                    start: Some("2015-01-31T10:00:00Z".parse().unwrap()),
                    duration: 110.0,
                    ..test_event("early", "Early")
                },
                Event {
                    duration: 25.0,
                    ..test_event("short", "Short")
                },
            ])
            .await
            .unwrap();

        // Act
        let query = Query::duration_range(Some(110.0), None);
        let result = index.search(&SearchRequest::new(query)).await.unwrap();

        // Assert
        assert_eq!(uids(&result), vec!["early", "late"]);
    }

    #[tokio::test]
    async fn invalid_query_string_is_reported() {
        // Arrange
        let index = setup_test_index().await;
        index.add_batch(&[test_event("event-1", "A")]).await.unwrap();

        // Act
        let query = Query::QueryString("summary:(".to_string());
        let err = index.search(&SearchRequest::new(query)).await.unwrap_err();

        // Assert
        assert!(matches!(err, Error::InvalidQuery(_)), "{err}");
    }

    #[tokio::test]
    async fn open_or_create_persists_to_file() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("index.db");
        let index = EventIndex::open_or_create(Some(&path)).await.unwrap();
        index
            .add_batch(&[test_event("event-1", "Bleve")])
            .await
            .unwrap();
        index.close().await.unwrap();

        // Act
        let reopened = EventIndex::open_or_create(Some(&path)).await.unwrap();

        // Assert
        assert_eq!(reopened.count().await.unwrap(), 1);
        reopened.close().await.unwrap();
    }
}
