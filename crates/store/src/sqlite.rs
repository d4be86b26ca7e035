use std::{str::FromStr, time::Duration};

use async_trait::async_trait;
use futures::StreamExt;
use homeplan_shared::Result;
use sea_query::{Expr, ExprTrait, Iden, OnConflict, Query, SqliteQueryBuilder};
use sea_query_sqlx::SqlxBinder;
use sqlx::{
    Row, SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};

use crate::{
    CollectionPath, Document, DocumentPath, DocumentStore, Fields, IdentityProvider, Session,
    Snapshot, Watch, WatchTarget, document::sort_newest_first, identity::normalize_email,
    password::{hash_password, verify_password},
};

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS project (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        api_key TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        fields TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        UNIQUE (collection, id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS revisions (
        collection TEXT PRIMARY KEY,
        revision INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        uid TEXT PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at INTEGER NOT NULL
    )
    "#,
];

#[derive(Iden, Clone)]
enum Project {
    Table,
    Id,
    ApiKey,
}

#[derive(Iden, Clone)]
enum Documents {
    Table,
    Seq,
    Collection,
    Id,
    Fields,
    CreatedAt,
}

#[derive(Iden, Clone)]
enum Revisions {
    Table,
    Collection,
    Revision,
}

#[derive(Iden, Clone)]
enum Users {
    Table,
    Uid,
    Email,
    PasswordHash,
    CreatedAt,
}

/// Document store and identity provider persisted in SQLite.
///
/// Watchers poll a per-collection revision counter, so writes made by other
/// processes sharing the database are observed as well.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    poll_interval: Duration,
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:")
}

fn pool_options(url: &str) -> SqlitePoolOptions {
    if is_in_memory(url) {
        // Every connection to an in-memory database is a different database,
        // and recycling the only one drops the data.
        return SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .max_lifetime(None)
            .idle_timeout(None);
    }

    SqlitePoolOptions::new().max_connections(5)
}

impl SqliteStore {
    /// Opens the database at `url`, creating it and its tables when missing.
    pub async fn open(url: &str, poll_interval: Duration) -> Result<Self> {
        let mut options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        if !is_in_memory(url) {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool = pool_options(url).connect_with(options).await?;

        Self::from_pool(pool, poll_interval).await
    }

    pub async fn from_pool(pool: SqlitePool, poll_interval: Duration) -> Result<Self> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }

        tracing::debug!("sqlite document store schema ready");

        Ok(Self {
            pool,
            poll_interval,
        })
    }

    /// Binds the database to `api_key` on first use and rejects any other key
    /// afterwards.
    pub async fn bind_api_key(&self, api_key: &str) -> Result<()> {
        let statement = Query::insert()
            .into_table(Project::Table)
            .columns([Project::Id, Project::ApiKey])
            .values_panic([1.into(), api_key.into()])
            .on_conflict(OnConflict::column(Project::Id).do_nothing().to_owned())
            .to_owned();

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        sqlx::query_with(&sql, values).execute(&self.pool).await?;

        let statement = Query::select()
            .column(Project::ApiKey)
            .from(Project::Table)
            .and_where(Expr::col(Project::Id).eq(1))
            .to_owned();

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        let bound: String = sqlx::query_scalar_with(&sql, values)
            .fetch_one(&self.pool)
            .await?;

        if bound != api_key {
            homeplan_shared::bail!("invalid api key");
        }

        Ok(())
    }

    async fn revision(&self, collection: &CollectionPath) -> Result<i64> {
        let statement = Query::select()
            .column(Revisions::Revision)
            .from(Revisions::Table)
            .and_where(Expr::col(Revisions::Collection).eq(collection.as_str()))
            .to_owned();

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        let revision: Option<i64> = sqlx::query_scalar_with(&sql, values)
            .fetch_optional(&self.pool)
            .await?;

        Ok(revision.unwrap_or(0))
    }

    async fn snapshot(&self, target: &WatchTarget) -> Result<Snapshot> {
        let mut statement = Query::select()
            .columns([
                Documents::Seq,
                Documents::Id,
                Documents::Fields,
                Documents::CreatedAt,
            ])
            .from(Documents::Table)
            .and_where(Expr::col(Documents::Collection).eq(target.collection().as_str()))
            .to_owned();

        if let WatchTarget::Document(path) = target {
            statement.and_where(Expr::col(Documents::Id).eq(path.id.as_str()));
        }

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        let rows = sqlx::query_with(&sql, values)
            .fetch_all(&self.pool)
            .await?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in rows {
            let fields: String = row.try_get("fields")?;
            docs.push((
                Document {
                    id: row.try_get("id")?,
                    fields: serde_json::from_str(&fields)?,
                    created_at: row.try_get("created_at")?,
                },
                row.try_get::<i64, _>("seq")?,
            ));
        }

        sort_newest_first(&mut docs);
        let mut docs = docs.into_iter().map(|(doc, _)| doc);

        Ok(match target {
            WatchTarget::Collection(_) => Snapshot::Collection(docs.collect()),
            WatchTarget::Document(_) => Snapshot::Document(docs.next()),
        })
    }
}

async fn bump_revision(
    conn: &mut sqlx::SqliteConnection,
    collection: &CollectionPath,
) -> Result<()> {
    let statement = Query::insert()
        .into_table(Revisions::Table)
        .columns([Revisions::Collection, Revisions::Revision])
        .values_panic([collection.as_str().into(), 1.into()])
        .on_conflict(
            OnConflict::column(Revisions::Collection)
                .value(Revisions::Revision, Expr::col(Revisions::Revision).add(1))
                .to_owned(),
        )
        .to_owned();

    let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
    sqlx::query_with(&sql, values).execute(conn).await?;

    Ok(())
}

struct Poll {
    store: SqliteStore,
    target: WatchTarget,
    last: Option<i64>,
    started: bool,
}

// Every transaction below starts with its write, so SQLite takes the write
// lock up front and waits on the busy timeout instead of failing a read to
// write upgrade.
#[async_trait]
impl DocumentStore for SqliteStore {
    async fn add(&self, collection: &CollectionPath, fields: Fields) -> Result<String> {
        let id = homeplan_shared::new_id();
        let statement = Query::insert()
            .into_table(Documents::Table)
            .columns([
                Documents::Collection,
                Documents::Id,
                Documents::Fields,
                Documents::CreatedAt,
            ])
            .values_panic([
                collection.as_str().into(),
                id.to_owned().into(),
                serde_json::to_string(&fields)?.into(),
                homeplan_shared::now_millis().into(),
            ])
            .to_owned();

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        let mut tx = self.pool.begin().await?;
        sqlx::query_with(&sql, values).execute(&mut *tx).await?;
        bump_revision(&mut tx, collection).await?;
        tx.commit().await?;

        Ok(id)
    }

    async fn update(&self, doc: &DocumentPath, fields: Fields) -> Result<()> {
        let statement = Query::update()
            .table(Documents::Table)
            .value(
                Documents::Fields,
                Expr::cust_with_values(
                    r#"json_patch("fields", ?)"#,
                    [serde_json::to_string(&fields)?],
                ),
            )
            .and_where(Expr::col(Documents::Collection).eq(doc.collection.as_str()))
            .and_where(Expr::col(Documents::Id).eq(doc.id.as_str()))
            .to_owned();

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query_with(&sql, values)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if updated == 0 {
            homeplan_shared::not_found!("document {doc}");
        }

        bump_revision(&mut tx, &doc.collection).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn merge(&self, doc: &DocumentPath, fields: Fields) -> Result<()> {
        let statement = Query::insert()
            .into_table(Documents::Table)
            .columns([
                Documents::Collection,
                Documents::Id,
                Documents::Fields,
                Documents::CreatedAt,
            ])
            .values_panic([
                doc.collection.as_str().into(),
                doc.id.as_str().into(),
                serde_json::to_string(&fields)?.into(),
                homeplan_shared::now_millis().into(),
            ])
            .on_conflict(
                OnConflict::columns([Documents::Collection, Documents::Id])
                    .value(
                        Documents::Fields,
                        Expr::cust(r#"json_patch("documents"."fields", "excluded"."fields")"#),
                    )
                    .to_owned(),
            )
            .to_owned();

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        let mut tx = self.pool.begin().await?;
        sqlx::query_with(&sql, values).execute(&mut *tx).await?;
        bump_revision(&mut tx, &doc.collection).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn delete(&self, doc: &DocumentPath) -> Result<()> {
        let statement = Query::delete()
            .from_table(Documents::Table)
            .and_where(Expr::col(Documents::Collection).eq(doc.collection.as_str()))
            .and_where(Expr::col(Documents::Id).eq(doc.id.as_str()))
            .to_owned();

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        let mut tx = self.pool.begin().await?;
        let removed = sqlx::query_with(&sql, values)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed > 0 {
            bump_revision(&mut tx, &doc.collection).await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn watch(&self, target: WatchTarget) -> Result<Watch> {
        let poll = Poll {
            store: self.clone(),
            target,
            last: None,
            started: false,
        };

        let stream = futures::stream::unfold(poll, |mut poll| async move {
            loop {
                if poll.started {
                    tokio::time::sleep(poll.store.poll_interval).await;
                }
                poll.started = true;

                let revision = match poll.store.revision(poll.target.collection()).await {
                    Ok(revision) => revision,
                    Err(err) => return Some((Err(err), poll)),
                };

                if poll.last == Some(revision) {
                    continue;
                }

                let snapshot = poll.store.snapshot(&poll.target).await;
                if snapshot.is_ok() {
                    poll.last = Some(revision);
                }

                return Some((snapshot, poll));
            }
        });

        Ok(stream.boxed())
    }
}

#[async_trait]
impl IdentityProvider for SqliteStore {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session> {
        let email = normalize_email(email);
        let uid = homeplan_shared::new_id();

        let statement = Query::insert()
            .into_table(Users::Table)
            .columns([
                Users::Uid,
                Users::Email,
                Users::PasswordHash,
                Users::CreatedAt,
            ])
            .values_panic([
                uid.to_owned().into(),
                email.to_owned().into(),
                hash_password(password)?.into(),
                homeplan_shared::now_millis().into(),
            ])
            .on_conflict(OnConflict::column(Users::Email).do_nothing().to_owned())
            .to_owned();

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        let inserted = sqlx::query_with(&sql, values)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if inserted == 0 {
            homeplan_shared::user!("email already in use");
        }

        Ok(Session { uid, email })
    }

    async fn log_in(&self, email: &str, password: &str) -> Result<Session> {
        let email = normalize_email(email);

        let statement = Query::select()
            .columns([Users::Uid, Users::PasswordHash])
            .from(Users::Table)
            .and_where(Expr::col(Users::Email).eq(email.as_str()))
            .limit(1)
            .to_owned();

        let (sql, values) = statement.build_sqlx(SqliteQueryBuilder);
        let row = sqlx::query_with(&sql, values)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            homeplan_shared::bail!("invalid email or password");
        };

        let password_hash: String = row.try_get("password_hash")?;
        if !verify_password(password, &password_hash)? {
            homeplan_shared::bail!("invalid email or password");
        }

        Ok(Session {
            uid: row.try_get("uid")?,
            email,
        })
    }
}
