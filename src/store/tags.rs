use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, FromQueryResult, IntoActiveModel, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};

use crate::{
    entities::{post_tag, tag},
    error::{Error, Result},
    store::Page,
};

/// Tag row augmented with how many posts currently carry it.
#[derive(Debug, Clone, FromQueryResult)]
pub struct TagWithCount {
    pub id: i32,
    pub name: String,
    pub post_count: i64,
}

pub async fn list(db: &DatabaseConnection, page: Page) -> Result<(Vec<TagWithCount>, u64)> {
    let active = tag::Entity::find().filter(tag::Column::DeletedAt.is_null());
    let total = active.clone().count(db).await?;
    let rows = active
        .column_as(
            Expr::col((post_tag::Entity, post_tag::Column::PostId)).count(),
            "post_count",
        )
        .join_rev(JoinType::LeftJoin, post_tag::Relation::Tag.def())
        .group_by(tag::Column::Id)
        .order_by_asc(tag::Column::Id)
        .limit(page.size)
        .offset(page.offset())
        .into_model::<TagWithCount>()
        .all(db)
        .await?;
    Ok((rows, total))
}

pub async fn find_active(db: &DatabaseConnection, id: i32) -> Result<Option<tag::Model>> {
    Ok(tag::Entity::find_by_id(id)
        .filter(tag::Column::DeletedAt.is_null())
        .one(db)
        .await?)
}

/// Resolve ids to active tags; absent ids are simply missing from the result.
pub async fn resolve<C: ConnectionTrait>(conn: &C, ids: &[i32]) -> Result<Vec<tag::Model>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(tag::Entity::find()
        .filter(tag::Column::DeletedAt.is_null())
        .filter(tag::Column::Id.is_in(ids.iter().copied()))
        .all(conn)
        .await?)
}

pub async fn create(db: &DatabaseConnection, name: &str) -> Result<tag::Model> {
    if name.is_empty() {
        return Err(Error::Validation("name is required".into()));
    }
    let duplicate = tag::Entity::find()
        .filter(tag::Column::DeletedAt.is_null())
        .filter(tag::Column::Name.eq(name))
        .one(db)
        .await?;
    if duplicate.is_some() {
        return Err(Error::Conflict("tag name already exists".into()));
    }
    let now = Utc::now();
    Ok(tag::ActiveModel {
        name: Set(name.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

/// Partial update: an empty name leaves the tag unchanged.
pub async fn update(db: &DatabaseConnection, id: i32, name: Option<&str>) -> Result<tag::Model> {
    let found = find_active(db, id).await?.ok_or(Error::NotFound("tag"))?;
    let mut model = found.into_active_model();
    if let Some(name) = name.filter(|v| !v.is_empty()) {
        model.name = Set(name.to_string());
    }
    model.updated_at = Set(Utc::now());
    Ok(model.update(db).await?)
}

pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<()> {
    let found = find_active(db, id).await?.ok_or(Error::NotFound("tag"))?;
    let mut model = found.into_active_model();
    model.deleted_at = Set(Some(Utc::now()));
    model.update(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{posts, testing};

    #[tokio::test]
    async fn name_unique_across_active_tags() {
        let db = testing::db().await;
        let rust = create(&db, "rust").await.unwrap();
        assert!(matches!(
            create(&db, "rust").await.unwrap_err(),
            Error::Conflict(_)
        ));
        delete(&db, rust.id).await.unwrap();
        create(&db, "rust").await.unwrap();
    }

    #[tokio::test]
    async fn list_reports_post_counts() {
        let db = testing::db().await;
        let author = testing::seed_author(&db).await;
        let used = create(&db, "used").await.unwrap();
        let unused = create(&db, "unused").await.unwrap();
        posts::create(
            &db,
            author.id,
            posts::PostContent {
                title: "t".into(),
                content: "c".into(),
                summary: String::new(),
                cover_image: String::new(),
            },
            &[],
            &[used.id],
        )
        .await
        .unwrap();

        let (rows, total) = list(&db, Page::default()).await.unwrap();
        assert_eq!(total, 2);
        let count_of = |id: i32| rows.iter().find(|t| t.id == id).unwrap().post_count;
        assert_eq!(count_of(used.id), 1);
        assert_eq!(count_of(unused.id), 0);
    }
}
