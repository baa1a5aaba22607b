use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::{
    entities::category,
    error::{Error, Result},
    store::Page,
};

pub async fn list(db: &DatabaseConnection, page: Page) -> Result<(Vec<category::Model>, u64)> {
    let query = category::Entity::find().filter(category::Column::DeletedAt.is_null());
    let total = query.clone().count(db).await?;
    let rows = query
        .order_by_asc(category::Column::Id)
        .limit(page.size)
        .offset(page.offset())
        .all(db)
        .await?;
    Ok((rows, total))
}

pub async fn find_active(db: &DatabaseConnection, id: i32) -> Result<Option<category::Model>> {
    Ok(category::Entity::find_by_id(id)
        .filter(category::Column::DeletedAt.is_null())
        .one(db)
        .await?)
}

/// Resolve a list of ids to active categories; absent ids are simply not in
/// the result. Callers decide whether that is an error.
pub async fn resolve<C: ConnectionTrait>(conn: &C, ids: &[i32]) -> Result<Vec<category::Model>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(category::Entity::find()
        .filter(category::Column::DeletedAt.is_null())
        .filter(category::Column::Id.is_in(ids.iter().copied()))
        .all(conn)
        .await?)
}

pub async fn create(
    db: &DatabaseConnection,
    name: &str,
    description: &str,
) -> Result<category::Model> {
    if name.is_empty() {
        return Err(Error::Validation("name is required".into()));
    }
    let duplicate = category::Entity::find()
        .filter(category::Column::DeletedAt.is_null())
        .filter(category::Column::Name.eq(name))
        .one(db)
        .await?;
    if duplicate.is_some() {
        return Err(Error::Conflict("category name already exists".into()));
    }
    let now = Utc::now();
    Ok(category::ActiveModel {
        name: Set(name.to_string()),
        description: Set(description.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

/// Partial update: only non-empty supplied fields are applied.
pub async fn update(
    db: &DatabaseConnection,
    id: i32,
    name: Option<&str>,
    description: Option<&str>,
) -> Result<category::Model> {
    let found = find_active(db, id).await?.ok_or(Error::NotFound("category"))?;
    let mut model = found.into_active_model();
    if let Some(name) = name.filter(|v| !v.is_empty()) {
        model.name = Set(name.to_string());
    }
    if let Some(description) = description.filter(|v| !v.is_empty()) {
        model.description = Set(description.to_string());
    }
    model.updated_at = Set(Utc::now());
    Ok(model.update(db).await?)
}

pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<()> {
    let found = find_active(db, id).await?.ok_or(Error::NotFound("category"))?;
    let mut model = found.into_active_model();
    model.deleted_at = Set(Some(Utc::now()));
    model.update(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing;

    #[tokio::test]
    async fn name_unique_across_active_rows() {
        let db = testing::db().await;
        let go = create(&db, "Go", "posts about go").await.unwrap();
        let err = create(&db, "Go", "again").await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        delete(&db, go.id).await.unwrap();
        create(&db, "Go", "reborn").await.unwrap();
    }

    #[tokio::test]
    async fn update_applies_only_non_empty_fields() {
        let db = testing::db().await;
        let cat = create(&db, "Go", "posts about go").await.unwrap();

        let updated = update(&db, cat.id, Some("Rust"), Some("")).await.unwrap();
        assert_eq!(updated.name, "Rust");
        assert_eq!(updated.description, "posts about go");

        let updated = update(&db, cat.id, None, Some("posts about rust"))
            .await
            .unwrap();
        assert_eq!(updated.name, "Rust");
        assert_eq!(updated.description, "posts about rust");
    }

    #[tokio::test]
    async fn delete_is_soft_and_hides_the_row() {
        let db = testing::db().await;
        let cat = create(&db, "Go", "d").await.unwrap();
        delete(&db, cat.id).await.unwrap();
        assert!(find_active(&db, cat.id).await.unwrap().is_none());
        let err = delete(&db, cat.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        let (rows, total) = list(&db, Page::default()).await.unwrap();
        assert!(rows.is_empty());
        assert_eq!(total, 0);
    }
}
