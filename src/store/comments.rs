use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::{
    entities::comment,
    error::{Error, Result},
    store::Page,
};

/// Comments for one post, newest first. The post id is not checked for
/// existence; an unknown id just yields an empty page.
pub async fn list_by_post(
    db: &DatabaseConnection,
    post_id: i32,
    page: Page,
) -> Result<(Vec<comment::Model>, u64)> {
    let query = comment::Entity::find()
        .filter(comment::Column::DeletedAt.is_null())
        .filter(comment::Column::PostId.eq(post_id));
    let total = query.clone().count(db).await?;
    let rows = query
        .order_by_desc(comment::Column::CreatedAt)
        .limit(page.size)
        .offset(page.offset())
        .all(db)
        .await?;
    Ok((rows, total))
}

pub async fn create(
    db: &DatabaseConnection,
    user_id: i32,
    post_id: i32,
    content: &str,
) -> Result<comment::Model> {
    if content.is_empty() {
        return Err(Error::Validation("content is required".into()));
    }
    let now = Utc::now();
    Ok(comment::ActiveModel {
        post_id: Set(post_id),
        user_id: Set(user_id),
        content: Set(content.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<()> {
    let found = comment::Entity::find_by_id(id)
        .filter(comment::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or(Error::NotFound("comment"))?;
    let mut model = found.into_active_model();
    model.deleted_at = Set(Some(Utc::now()));
    model.update(db).await?;
    Ok(())
}

/// Sweep used by the post-delete cascade.
pub async fn delete_by_post(db: &DatabaseConnection, post_id: i32) -> Result<()> {
    comment::Entity::update_many()
        .col_expr(comment::Column::DeletedAt, Expr::value(Some(Utc::now())))
        .filter(comment::Column::PostId.eq(post_id))
        .filter(comment::Column::DeletedAt.is_null())
        .exec(db)
        .await?;
    Ok(())
}
