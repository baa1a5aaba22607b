use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use sea_orm_migration::MigratorTrait;

use crate::{
    config::AppConfig,
    entities::{
        site_config,
        user::{self, Role},
    },
    error::Result,
    migration::Migrator,
    store,
};

// sha256("admin"); an operational default that must be rotated in production.
const BOOTSTRAP_ADMIN_DIGEST: &str =
    "8c6976e5b5410415bde908bd4dee15dfb167a9c873fc4bb8a81f6f2ab448a918";

pub async fn connect(cfg: &AppConfig) -> Result<DatabaseConnection> {
    Ok(Database::connect(&cfg.database_url).await?)
}

/// Run migrations and seed the bootstrap records: one admin account,
/// `enable_register` and `sites_name`. Idempotent across restarts.
pub async fn initialize(db: &DatabaseConnection) -> Result<()> {
    Migrator::up(db, None).await?;

    let admin = user::Entity::find()
        .filter(user::Column::DeletedAt.is_null())
        .filter(user::Column::Role.eq(Role::Admin))
        .one(db)
        .await?;
    if admin.is_none() {
        let now = Utc::now();
        user::ActiveModel {
            username: Set("admin".into()),
            email: Set("admin@easyblog.com".into()),
            password: Set(BOOTSTRAP_ADMIN_DIGEST.into()),
            avatar: Set(String::new()),
            role: Set(Role::Admin),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await?;
        tracing::warn!("created bootstrap admin account with the default password, rotate it");
    }

    for (key, value) in [
        (store::site_config::ENABLE_REGISTER, "false"),
        (store::site_config::SITES_NAME, "Easy Blog"),
    ] {
        if store::site_config::value(db, key).await?.is_none() {
            let now = Utc::now();
            site_config::ActiveModel {
                key: Set(key.into()),
                value: Set(value.into()),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await?;
            tracing::info!(key, value, "seeded config default");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        initialize(&db).await.unwrap();
        initialize(&db).await.unwrap();

        let admins = user::Entity::find()
            .filter(user::Column::Role.eq(Role::Admin))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].email, "admin@easyblog.com");

        assert_eq!(
            store::site_config::value(&db, store::site_config::ENABLE_REGISTER)
                .await
                .unwrap()
                .as_deref(),
            Some("false")
        );
        assert_eq!(
            store::site_config::value(&db, store::site_config::SITES_NAME)
                .await
                .unwrap()
                .as_deref(),
            Some("Easy Blog")
        );
    }
}
