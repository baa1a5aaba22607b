//! Data operations against the content and credential stores. All queries
//! here filter soft-deleted rows; deletion sets `deleted_at` instead of
//! removing the record.

pub mod categories;
pub mod comments;
pub mod friends;
pub mod posts;
pub mod site_config;
pub mod tags;
pub mod users;

/// Pagination window shared by every list operation: `page` defaults to 0
/// and never goes negative, `size` defaults to 10 and is clamped to [1, 20].
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: u64,
    pub size: u64,
}

impl Page {
    pub const DEFAULT_SIZE: i64 = 10;
    pub const MAX_SIZE: i64 = 20;

    pub fn new(page: Option<i64>, size: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(0).max(0) as u64,
            size: size.unwrap_or(Self::DEFAULT_SIZE).clamp(1, Self::MAX_SIZE) as u64,
        }
    }

    pub fn offset(&self) -> u64 {
        self.page * self.size
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::Utc;
    use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
    use sea_orm_migration::MigratorTrait;

    use crate::entities::user::{self, Role};
    use crate::migration::Migrator;

    pub async fn db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("connect to in-memory sqlite");
        Migrator::up(&db, None).await.expect("run migrations");
        db
    }

    pub async fn seed_author(db: &DatabaseConnection) -> user::Model {
        let now = Utc::now();
        user::ActiveModel {
            username: Set("author".into()),
            email: Set("author@example.com".into()),
            password: Set("ab".repeat(32)),
            avatar: Set(String::new()),
            role: Set(Role::User),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("seed author")
    }
}

#[cfg(test)]
mod tests {
    use super::Page;

    #[test]
    fn size_is_clamped() {
        assert_eq!(Page::new(None, Some(500)).size, 20);
        assert_eq!(Page::new(None, Some(0)).size, 1);
        assert_eq!(Page::new(None, None).size, 10);
    }

    #[test]
    fn negative_page_falls_back_to_zero() {
        assert_eq!(Page::new(Some(-1), None).page, 0);
        assert_eq!(Page::new(Some(3), Some(10)).offset(), 30);
    }
}
