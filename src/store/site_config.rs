use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::{
    entities::site_config,
    error::{Error, Result},
    store::Page,
};

/// Gates whether new user registration is permitted; must be exactly "true".
pub const ENABLE_REGISTER: &str = "enable_register";
/// Site display name.
pub const SITES_NAME: &str = "sites_name";

pub async fn list(
    db: &DatabaseConnection,
    page: Page,
) -> Result<(Vec<site_config::Model>, u64)> {
    let query = site_config::Entity::find().filter(site_config::Column::DeletedAt.is_null());
    let total = query.clone().count(db).await?;
    let rows = query
        .order_by_asc(site_config::Column::Id)
        .limit(page.size)
        .offset(page.offset())
        .all(db)
        .await?;
    Ok((rows, total))
}

async fn find_active(db: &DatabaseConnection, key: &str) -> Result<Option<site_config::Model>> {
    Ok(site_config::Entity::find()
        .filter(site_config::Column::DeletedAt.is_null())
        .filter(site_config::Column::Key.eq(key))
        .one(db)
        .await?)
}

pub async fn get(db: &DatabaseConnection, key: &str) -> Result<site_config::Model> {
    find_active(db, key).await?.ok_or(Error::NotFound("config"))
}

/// Value of an active config entry, or None if the key does not resolve.
pub async fn value(db: &DatabaseConnection, key: &str) -> Result<Option<String>> {
    Ok(find_active(db, key).await?.map(|entry| entry.value))
}

pub async fn create(db: &DatabaseConnection, key: &str, value: &str) -> Result<site_config::Model> {
    if key.is_empty() {
        return Err(Error::Validation("key is required".into()));
    }
    if find_active(db, key).await?.is_some() {
        return Err(Error::Conflict("key already exists".into()));
    }
    let now = Utc::now();
    Ok(site_config::ActiveModel {
        key: Set(key.to_string()),
        value: Set(value.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

pub async fn update(db: &DatabaseConnection, key: &str, value: &str) -> Result<site_config::Model> {
    let entry = get(db, key).await?;
    let mut entry = entry.into_active_model();
    entry.value = Set(value.to_string());
    entry.updated_at = Set(Utc::now());
    Ok(entry.update(db).await?)
}

pub async fn delete(db: &DatabaseConnection, key: &str) -> Result<()> {
    let entry = get(db, key).await?;
    let mut entry = entry.into_active_model();
    entry.deleted_at = Set(Some(Utc::now()));
    entry.update(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing;

    #[tokio::test]
    async fn key_is_unique_across_active_entries() {
        let db = testing::db().await;
        create(&db, "theme", "dark").await.unwrap();
        let err = create(&db, "theme", "light").await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        // A soft-deleted entry no longer reserves its key.
        delete(&db, "theme").await.unwrap();
        create(&db, "theme", "light").await.unwrap();
        assert_eq!(value(&db, "theme").await.unwrap().unwrap(), "light");
    }

    #[tokio::test]
    async fn update_and_delete_by_key() {
        let db = testing::db().await;
        create(&db, SITES_NAME, "Easy Blog").await.unwrap();
        update(&db, SITES_NAME, "My Blog").await.unwrap();
        assert_eq!(value(&db, SITES_NAME).await.unwrap().unwrap(), "My Blog");

        delete(&db, SITES_NAME).await.unwrap();
        assert!(value(&db, SITES_NAME).await.unwrap().is_none());
        let err = update(&db, SITES_NAME, "x").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn list_excludes_deleted_and_paginates() {
        let db = testing::db().await;
        for i in 0..3 {
            create(&db, &format!("k{i}"), "v").await.unwrap();
        }
        delete(&db, "k1").await.unwrap();
        let (rows, total) = list(&db, Page::default()).await.unwrap();
        assert_eq!(total, 2);
        assert!(rows.iter().all(|row| row.key != "k1"));
    }
}
