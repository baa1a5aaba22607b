use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::{
    entities::friends_link,
    error::{Error, Result},
    store::Page,
};

#[derive(Debug, Clone, Default)]
pub struct FriendsLinkFields {
    pub title: String,
    pub link: String,
    pub avatar: String,
    pub description: String,
}

pub async fn list(
    db: &DatabaseConnection,
    page: Page,
) -> Result<(Vec<friends_link::Model>, u64)> {
    let query = friends_link::Entity::find().filter(friends_link::Column::DeletedAt.is_null());
    let total = query.clone().count(db).await?;
    let rows = query
        .order_by_asc(friends_link::Column::Id)
        .limit(page.size)
        .offset(page.offset())
        .all(db)
        .await?;
    Ok((rows, total))
}

pub async fn create(
    db: &DatabaseConnection,
    fields: FriendsLinkFields,
) -> Result<friends_link::Model> {
    if fields.title.is_empty() || fields.link.is_empty() {
        return Err(Error::Validation("title and link are required".into()));
    }
    let now = Utc::now();
    Ok(friends_link::ActiveModel {
        title: Set(fields.title),
        link: Set(fields.link),
        avatar: Set(fields.avatar),
        description: Set(fields.description),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

/// Full replacement, unlike the partial-update semantics of the other
/// simple entities.
pub async fn update(
    db: &DatabaseConnection,
    id: i32,
    fields: FriendsLinkFields,
) -> Result<friends_link::Model> {
    let found = friends_link::Entity::find_by_id(id)
        .filter(friends_link::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or(Error::NotFound("friends link"))?;
    let mut model = found.into_active_model();
    model.title = Set(fields.title);
    model.link = Set(fields.link);
    model.avatar = Set(fields.avatar);
    model.description = Set(fields.description);
    model.updated_at = Set(Utc::now());
    Ok(model.update(db).await?)
}

pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<()> {
    let found = friends_link::Entity::find_by_id(id)
        .filter(friends_link::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or(Error::NotFound("friends link"))?;
    let mut model = found.into_active_model();
    model.deleted_at = Set(Some(Utc::now()));
    model.update(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing;

    fn fields(title: &str) -> FriendsLinkFields {
        FriendsLinkFields {
            title: title.into(),
            link: "https://example.com".into(),
            avatar: "https://example.com/a.png".into(),
            description: "a friend".into(),
        }
    }

    #[tokio::test]
    async fn update_is_full_replacement() {
        let db = testing::db().await;
        let created = create(&db, fields("friend")).await.unwrap();

        let replaced = update(
            &db,
            created.id,
            FriendsLinkFields {
                title: "renamed".into(),
                link: "https://other.example".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(replaced.title, "renamed");
        // Unsupplied fields are blanked, not preserved.
        assert_eq!(replaced.avatar, "");
        assert_eq!(replaced.description, "");
    }

    #[tokio::test]
    async fn create_requires_title_and_link() {
        let db = testing::db().await;
        let err = create(&db, FriendsLinkFields::default()).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn delete_hides_from_list() {
        let db = testing::db().await;
        let created = create(&db, fields("friend")).await.unwrap();
        delete(&db, created.id).await.unwrap();
        let (rows, total) = list(&db, Page::default()).await.unwrap();
        assert!(rows.is_empty());
        assert_eq!(total, 0);
        assert!(matches!(
            delete(&db, created.id).await.unwrap_err(),
            Error::NotFound(_)
        ));
    }
}
