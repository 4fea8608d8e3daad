use chrono::NaiveDateTime;
use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::{fs, path::Path};
mod models;
mod repo;

pub use repo::communities::CreateCommunityOutcome;
pub use repo::snippets::{Membership, MembershipChange, UserSnippets};
pub use repo::votes::VoteCastOutcome;

#[derive(Clone)]
pub struct Db {
    pub(crate) pool: Pool<Sqlite>,
}

impl Db {
    pub async fn new(db_url: &str) -> anyhow::Result<Self> {
        let in_memory = db_url.contains(":memory:");
        if db_url.starts_with("sqlite://") && !in_memory {
            let path_str = db_url.trim_start_matches("sqlite://");
            let path = Path::new(path_str);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    fs::create_dir_all(parent)?;
                }
            }
        }
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            Sqlite::create_database(db_url).await?;
        }

        // Every pooled connection to :memory: would open its own empty database.
        let options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };
        let pool = options.connect(db_url).await?;
        sqlx::query("PRAGMA journal_mode = WAL;")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA synchronous = NORMAL;")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA foreign_keys = ON;")
            .execute(&pool)
            .await?;
        sqlx::migrate!("../../migrations").run(&pool).await?;
        tracing::debug!("Database ready at {}", db_url);
        Ok(Self { pool })
    }
}

pub(crate) fn new_id() -> String {
    format!("{:x}", rand::random::<u128>())
}

pub(crate) fn now() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::{CreateCommunityOutcome, Db};
    use domain::{Community, CommunityName, NewCommunity, NewPost, Post, PrivacyType, UserProfile};

    pub async fn db() -> Db {
        Db::new("sqlite::memory:").await.unwrap()
    }

    /// A real file with a multi-connection pool, for lock contention tests.
    pub async fn file_db() -> Db {
        let dir = std::env::temp_dir().join(format!("tumindig-db-{:x}", rand::random::<u64>()));
        let path = dir.join("test.db");
        Db::new(&format!("sqlite://{}", path.display())).await.unwrap()
    }

    pub async fn user(db: &Db, name: &str) -> UserProfile {
        db.create_user(&format!("{}@example.org", name), name, &format!("hash-{}", name))
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn community(db: &Db, owner: &UserProfile, name: &str) -> Community {
        community_with(db, owner, name, PrivacyType::Public).await
    }

    pub async fn community_with(
        db: &Db,
        owner: &UserProfile,
        name: &str,
        privacy_type: PrivacyType,
    ) -> Community {
        let draft = NewCommunity {
            name: name.into(),
            privacy_type,
            category: "Environment".into(),
            description: "Volunteers welcome".into(),
        };
        let name = CommunityName::parse(name).unwrap();
        match db.create_community(&name, &owner.id, &draft).await.unwrap() {
            CreateCommunityOutcome::Created(c) => c,
            CreateCommunityOutcome::NameTaken => panic!("community {} already exists", name),
        }
    }

    pub async fn post(db: &Db, community: &Community, author: &UserProfile, title: &str) -> Post {
        let draft = NewPost {
            title: title.into(),
            body: String::new(),
            image_urls: vec![],
            is_volunteer: false,
            event: None,
        };
        db.create_post(&community.id, author, &draft).await.unwrap()
    }
}
