//! SQLite implementation of the repository traits.
//!
//! Multi-row writes (team creation, pull request save) run inside a single
//! transaction so a failure part-way through leaves no partial state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Sqlite, Transaction};

use super::{PullRequestRepository, TeamRepository, UserRepository};
use crate::db::pool::DbPool;
use crate::db::DbError;
use crate::models::{PullRequest, PullRequestStatus, Team, User};

const USER_COLUMNS: &str = "id, username, team_name, is_active";

const UPSERT_USER: &str = r#"
    INSERT INTO users (id, username, team_name, is_active)
    VALUES (?, ?, ?, ?)
    ON CONFLICT (id) DO UPDATE SET
        username = excluded.username,
        team_name = excluded.team_name,
        is_active = excluded.is_active
"#;

/// SQLite-backed store implementing all three repository traits.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

/// Row shape of the `pull_requests` table.
#[derive(Debug, FromRow)]
struct PullRequestRow {
    id: String,
    name: String,
    author_id: String,
    status: String,
    /// Unix milliseconds.
    created_at: i64,
    /// Unix milliseconds, set once merged.
    merged_at: Option<i64>,
}

fn from_millis(ms: i64, column: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| DbError::Constraint(format!("{} out of range: {}", column, ms)))
}

impl PullRequestRow {
    fn into_model(self, assigned_reviewers: Vec<String>) -> Result<PullRequest, DbError> {
        let status = PullRequestStatus::parse(&self.status).ok_or_else(|| {
            DbError::Constraint(format!(
                "unknown status {:?} on pull request {}",
                self.status, self.id
            ))
        })?;

        Ok(PullRequest {
            status,
            assigned_reviewers,
            created_at: from_millis(self.created_at, "created_at")?,
            merged_at: self
                .merged_at
                .map(|ms| from_millis(ms, "merged_at"))
                .transpose()?,
            id: self.id,
            name: self.name,
            author_id: self.author_id,
        })
    }
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn reviewers_of(&self, pr_id: &str) -> Result<Vec<String>, DbError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT user_id FROM pr_reviewers WHERE pr_id = ? ORDER BY position",
        )
        .bind(pr_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(user_id,)| user_id).collect())
    }

    async fn hydrate(&self, row: PullRequestRow) -> Result<PullRequest, DbError> {
        let reviewers = self.reviewers_of(&row.id).await?;
        row.into_model(reviewers)
    }

    async fn upsert_user(tx: &mut Transaction<'_, Sqlite>, user: &User) -> Result<(), DbError> {
        sqlx::query(UPSERT_USER)
            .bind(&user.id)
            .bind(&user.username)
            .bind(&user.team_name)
            .bind(user.is_active)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for SqliteStore {
    async fn get_by_id(&self, id: &str) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_by_team(&self, team_name: &str) -> Result<Vec<User>, DbError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE team_name = ? ORDER BY id",
            USER_COLUMNS
        ))
        .bind(team_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn get_active_by_team(&self, team_name: &str) -> Result<Vec<User>, DbError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE team_name = ? AND is_active = 1 ORDER BY id",
            USER_COLUMNS
        ))
        .bind(team_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn save(&self, user: &User) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        Self::upsert_user(&mut tx, user).await?;
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl TeamRepository for SqliteStore {
    async fn create(&self, team: &Team) -> Result<(), DbError> {
        // Dropping the transaction without commit rolls it back.
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO teams (name) VALUES (?)")
            .bind(&team.name)
            .execute(&mut *tx)
            .await?;

        for member in &team.members {
            let mut member = member.clone();
            member.team_name = team.name.clone();
            Self::upsert_user(&mut tx, &member).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Team>, DbError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT name FROM teams WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        let Some((name,)) = row else {
            return Ok(None);
        };

        let members = self.get_by_team(&name).await?;
        Ok(Some(Team { name, members }))
    }
}

#[async_trait]
impl PullRequestRepository for SqliteStore {
    async fn get_by_id(&self, id: &str) -> Result<Option<PullRequest>, DbError> {
        let row = sqlx::query_as::<_, PullRequestRow>(
            r#"
            SELECT id, name, author_id, status, created_at, merged_at
            FROM pull_requests
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row).await?)),
            None => Ok(None),
        }
    }

    async fn save(&self, pr: &PullRequest) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO pull_requests (id, name, author_id, status, created_at, merged_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                author_id = excluded.author_id,
                status = excluded.status,
                created_at = excluded.created_at,
                merged_at = excluded.merged_at
            "#,
        )
        .bind(&pr.id)
        .bind(&pr.name)
        .bind(&pr.author_id)
        .bind(pr.status.as_str())
        .bind(pr.created_at.timestamp_millis())
        .bind(pr.merged_at.map(|t| t.timestamp_millis()))
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM pr_reviewers WHERE pr_id = ?")
            .bind(&pr.id)
            .execute(&mut *tx)
            .await?;

        for (position, user_id) in pr.assigned_reviewers.iter().enumerate() {
            sqlx::query("INSERT INTO pr_reviewers (pr_id, user_id, position) VALUES (?, ?, ?)")
                .bind(&pr.id)
                .bind(user_id)
                .bind(position as i64)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_by_reviewer(&self, user_id: &str) -> Result<Vec<PullRequest>, DbError> {
        let rows = sqlx::query_as::<_, PullRequestRow>(
            r#"
            SELECT pr.id, pr.name, pr.author_id, pr.status, pr.created_at, pr.merged_at
            FROM pr_reviewers r
            JOIN pull_requests pr ON pr.id = r.pr_id
            WHERE r.user_id = ?
            ORDER BY pr.created_at, pr.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut prs = Vec::with_capacity(rows.len());
        for row in rows {
            prs.push(self.hydrate(row).await?);
        }
        Ok(prs)
    }

    async fn has_open_pull_requests(&self, user_ids: &[String]) -> Result<bool, DbError> {
        if user_ids.is_empty() {
            return Ok(false);
        }

        // The id list is bound once per use as a JSON array and unpacked with json_each.
        let ids = serde_json::to_string(user_ids)
            .map_err(|e| DbError::Constraint(format!("unencodable user ids: {}", e)))?;

        let found: i64 = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM pull_requests pr
                WHERE pr.status = 'OPEN'
                  AND (
                    pr.author_id IN (SELECT value FROM json_each(?))
                    OR EXISTS (
                        SELECT 1 FROM pr_reviewers r
                        WHERE r.pr_id = pr.id
                          AND r.user_id IN (SELECT value FROM json_each(?))
                    )
                  )
            )
            "#,
        )
        .bind(&ids)
        .bind(&ids)
        .fetch_one(&self.pool)
        .await?;

        Ok(found != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use tempfile::{tempdir, TempDir};

    async fn setup() -> (TempDir, SqliteStore) {
        let dir = tempdir().unwrap();
        let pool = db::initialize(&dir.path().join("test.db")).await.unwrap();
        (dir, SqliteStore::new(pool))
    }

    fn core_team() -> Team {
        Team::new(
            "core",
            vec![
                User::new("a", "alice", "", true),
                User::new("b", "bob", "", true),
                User::new("c", "carol", "", false),
            ],
        )
    }

    #[tokio::test]
    async fn test_team_round_trip() {
        let (_dir, store) = setup().await;
        store.create(&core_team()).await.unwrap();

        let team = store.get_by_name("core").await.unwrap().unwrap();
        assert_eq!(team.member_ids(), vec!["a", "b", "c"]);
        assert!(team.members.iter().all(|m| m.team_name == "core"));
        assert!(!team.members[2].is_active);

        let active = store.get_active_by_team("core").await.unwrap();
        assert_eq!(active.len(), 2);

        assert!(store.get_by_name("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_team_create_rolls_back_on_member_failure() {
        let (_dir, store) = setup().await;
        // The empty username violates the users CHECK constraint after the
        // team row has already been inserted.
        let team = Team::new(
            "broken",
            vec![
                User::new("x", "xavier", "", true),
                User::new("y", "", "", true),
            ],
        );

        assert!(store.create(&team).await.is_err());
        assert!(store.get_by_name("broken").await.unwrap().is_none());
        assert!(UserRepository::get_by_id(&store, "x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_team_is_a_storage_error() {
        let (_dir, store) = setup().await;
        store.create(&core_team()).await.unwrap();
        let err = store.create(&core_team()).await.unwrap_err();
        assert!(matches!(err, DbError::Sqlite(_)));
    }

    #[tokio::test]
    async fn test_user_upsert() {
        let (_dir, store) = setup().await;
        store.create(&core_team()).await.unwrap();

        let mut bob = UserRepository::get_by_id(&store, "b").await.unwrap().unwrap();
        bob.deactivate();
        UserRepository::save(&store, &bob).await.unwrap();

        let reloaded = UserRepository::get_by_id(&store, "b").await.unwrap().unwrap();
        assert!(!reloaded.is_active);
        assert!(UserRepository::get_by_id(&store, "zed").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pull_request_save_replaces_reviewers_in_order() {
        let (_dir, store) = setup().await;
        store.create(&core_team()).await.unwrap();

        let mut pr = PullRequest::new("pr-1", "feat", "a");
        pr.assigned_reviewers = vec!["c".into(), "b".into()];
        PullRequestRepository::save(&store, &pr).await.unwrap();

        let loaded = PullRequestRepository::get_by_id(&store, "pr-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded, pr);

        pr.replace_reviewer("c", "a");
        pr.merge();
        PullRequestRepository::save(&store, &pr).await.unwrap();

        let loaded = PullRequestRepository::get_by_id(&store, "pr-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.assigned_reviewers, vec!["a", "b"]);
        assert_eq!(loaded.status, PullRequestStatus::Merged);
        assert_eq!(loaded.merged_at, pr.merged_at);
    }

    #[tokio::test]
    async fn test_get_by_reviewer_includes_merged() {
        let (_dir, store) = setup().await;
        store.create(&core_team()).await.unwrap();

        let mut open = PullRequest::new("pr-1", "one", "a");
        open.assigned_reviewers = vec!["b".into()];
        let mut merged = PullRequest::new("pr-2", "two", "a");
        merged.assigned_reviewers = vec!["b".into(), "c".into()];
        merged.merge();
        PullRequestRepository::save(&store, &open).await.unwrap();
        PullRequestRepository::save(&store, &merged).await.unwrap();

        let for_b = store.get_by_reviewer("b").await.unwrap();
        let mut ids: Vec<&str> = for_b.iter().map(|pr| pr.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["pr-1", "pr-2"]);

        let for_c = store.get_by_reviewer("c").await.unwrap();
        assert_eq!(for_c.len(), 1);
        assert_eq!(for_c[0].assigned_reviewers, vec!["b", "c"]);

        assert!(store.get_by_reviewer("a").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_has_open_pull_requests() {
        let (_dir, store) = setup().await;
        store.create(&core_team()).await.unwrap();

        let mut pr = PullRequest::new("pr-1", "feat", "a");
        pr.assigned_reviewers = vec!["b".into()];
        PullRequestRepository::save(&store, &pr).await.unwrap();

        assert!(store.has_open_pull_requests(&["a".into()]).await.unwrap());
        assert!(store.has_open_pull_requests(&["c".into(), "b".into()]).await.unwrap());
        assert!(!store.has_open_pull_requests(&["c".into()]).await.unwrap());
        assert!(!store.has_open_pull_requests(&[]).await.unwrap());

        pr.merge();
        PullRequestRepository::save(&store, &pr).await.unwrap();
        assert!(!store.has_open_pull_requests(&["a".into(), "b".into()]).await.unwrap());
    }
}
