use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, DatabaseTransaction, EntityTrait, IntoActiveModel, JoinType, LoaderTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};

use crate::{
    entities::{
        category,
        post::{self, PostStatus},
        post_category, post_tag, tag, user,
    },
    error::{Error, Result},
    store::{categories, comments, tags, Page},
};

#[derive(Debug, Clone, Default)]
pub struct PostContent {
    pub title: String,
    pub content: String,
    pub summary: String,
    pub cover_image: String,
}

/// A post together with its loaded author and association sets.
#[derive(Debug, Clone)]
pub struct PostRecord {
    pub post: post::Model,
    pub author: Option<user::Model>,
    pub categories: Vec<category::Model>,
    pub tags: Vec<tag::Model>,
}

impl PostContent {
    fn validate(&self) -> Result<()> {
        if self.title.is_empty() {
            return Err(Error::Validation("title is required".into()));
        }
        if self.content.is_empty() {
            return Err(Error::Validation("content is required".into()));
        }
        Ok(())
    }
}

/// Create a post owned by `author_id`. Category and tag ids that do not
/// resolve are dropped without error; the post keeps whatever subset
/// resolved. Update is the strict counterpart.
pub async fn create(
    db: &DatabaseConnection,
    author_id: i32,
    content: PostContent,
    category_ids: &[i32],
    tag_ids: &[i32],
) -> Result<PostRecord> {
    content.validate()?;
    let txn = db.begin().await?;
    let resolved_categories = categories::resolve(&txn, category_ids).await?;
    let resolved_tags = tags::resolve(&txn, tag_ids).await?;

    let now = Utc::now();
    let created = post::ActiveModel {
        title: Set(content.title),
        content: Set(content.content),
        summary: Set(content.summary),
        cover_image: Set(content.cover_image),
        author_id: Set(author_id),
        status: Set(PostStatus::Draft),
        view_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    link_categories(&txn, created.id, &resolved_categories).await?;
    link_tags(&txn, created.id, &resolved_tags).await?;
    txn.commit().await?;

    get_without_view_bump(db, created.id).await
}

/// Update fields and replace both association sets as one atomic unit. Any
/// supplied id that does not resolve rejects the whole update; an empty id
/// list clears the corresponding association.
pub async fn update(
    db: &DatabaseConnection,
    id: i32,
    content: PostContent,
    category_ids: &[i32],
    tag_ids: &[i32],
) -> Result<PostRecord> {
    content.validate()?;
    let txn = db.begin().await?;
    match update_in_txn(&txn, id, content, category_ids, tag_ids).await {
        Ok(()) => txn.commit().await?,
        Err(err) => {
            txn.rollback().await?;
            return Err(err);
        }
    }
    get_without_view_bump(db, id).await
}

async fn update_in_txn(
    txn: &DatabaseTransaction,
    id: i32,
    content: PostContent,
    category_ids: &[i32],
    tag_ids: &[i32],
) -> Result<()> {
    let found = post::Entity::find_by_id(id)
        .filter(post::Column::DeletedAt.is_null())
        .one(txn)
        .await?
        .ok_or(Error::NotFound("post"))?;

    let resolved_categories = categories::resolve(txn, category_ids).await?;
    if resolved_categories.len() != category_ids.len() {
        return Err(Error::Validation("some category ids are invalid".into()));
    }
    let resolved_tags = tags::resolve(txn, tag_ids).await?;
    if resolved_tags.len() != tag_ids.len() {
        return Err(Error::Validation("some tag ids are invalid".into()));
    }

    let mut model = found.into_active_model();
    model.title = Set(content.title);
    model.content = Set(content.content);
    model.summary = Set(content.summary);
    model.cover_image = Set(content.cover_image);
    model.updated_at = Set(Utc::now());
    model.update(txn).await?;

    post_category::Entity::delete_many()
        .filter(post_category::Column::PostId.eq(id))
        .exec(txn)
        .await?;
    post_tag::Entity::delete_many()
        .filter(post_tag::Column::PostId.eq(id))
        .exec(txn)
        .await?;
    link_categories(txn, id, &resolved_categories).await?;
    link_tags(txn, id, &resolved_tags).await?;
    Ok(())
}

async fn link_categories<C: ConnectionTrait>(
    conn: &C,
    post_id: i32,
    categories: &[category::Model],
) -> Result<()> {
    post_category::Entity::insert_many(categories.iter().map(|cat| {
        post_category::ActiveModel {
            post_id: Set(post_id),
            category_id: Set(cat.id),
        }
    }))
    .on_empty_do_nothing()
    .exec(conn)
    .await?;
    Ok(())
}

async fn link_tags<C: ConnectionTrait>(conn: &C, post_id: i32, tags: &[tag::Model]) -> Result<()> {
    post_tag::Entity::insert_many(tags.iter().map(|tag| post_tag::ActiveModel {
        post_id: Set(post_id),
        tag_id: Set(tag.id),
    }))
    .on_empty_do_nothing()
    .exec(conn)
    .await?;
    Ok(())
}

/// Soft-delete the post, then its comments. The two steps are not atomic;
/// if the comment sweep fails the error is surfaced so the caller sees the
/// partial result.
pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<()> {
    let found = post::Entity::find_by_id(id)
        .filter(post::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or(Error::NotFound("post"))?;
    let mut model = found.into_active_model();
    model.deleted_at = Set(Some(Utc::now()));
    model.update(db).await?;

    comments::delete_by_post(db, id).await.map_err(|err| {
        tracing::warn!(post_id = id, "post deleted but comment sweep failed");
        err
    })
}

/// Fetch one post and bump its view counter. The bump is best-effort: a
/// failure to persist it never fails the read.
pub async fn get(db: &DatabaseConnection, id: i32) -> Result<PostRecord> {
    let mut record = get_without_view_bump(db, id).await?;
    let bumped = post::Entity::update_many()
        .col_expr(
            post::Column::ViewCount,
            Expr::col(post::Column::ViewCount).add(1),
        )
        .filter(post::Column::Id.eq(id))
        .exec(db)
        .await;
    match bumped {
        Ok(_) => record.post.view_count += 1,
        Err(err) => tracing::warn!(post_id = id, error = %err, "view count bump failed"),
    }
    Ok(record)
}

async fn get_without_view_bump(db: &DatabaseConnection, id: i32) -> Result<PostRecord> {
    let post = post::Entity::find_by_id(id)
        .filter(post::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or(Error::NotFound("post"))?;
    Ok(load_relations(db, vec![post]).await?.swap_remove(0))
}

/// Newest-first listing with an optional free-text filter matched against
/// title or summary. The returned total ignores the pagination window.
pub async fn list(
    db: &DatabaseConnection,
    q: Option<&str>,
    page: Page,
) -> Result<(Vec<PostRecord>, u64)> {
    let mut query = post::Entity::find().filter(post::Column::DeletedAt.is_null());
    if let Some(q) = q.filter(|s| !s.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(post::Column::Title.contains(q))
                .add(post::Column::Summary.contains(q)),
        );
    }
    let total = query.clone().count(db).await?;
    let rows = query
        .order_by_desc(post::Column::CreatedAt)
        .limit(page.size)
        .offset(page.offset())
        .all(db)
        .await?;
    Ok((load_relations(db, rows).await?, total))
}

pub async fn by_category(db: &DatabaseConnection, category_id: i32) -> Result<Vec<PostRecord>> {
    categories::find_active(db, category_id)
        .await?
        .ok_or(Error::NotFound("category"))?;
    let rows = post::Entity::find()
        .filter(post::Column::DeletedAt.is_null())
        .join_rev(JoinType::InnerJoin, post_category::Relation::Post.def())
        .filter(post_category::Column::CategoryId.eq(category_id))
        .order_by_desc(post::Column::CreatedAt)
        .all(db)
        .await?;
    load_relations(db, rows).await
}

pub async fn by_tag(db: &DatabaseConnection, tag_id: i32) -> Result<Vec<PostRecord>> {
    let rows = post::Entity::find()
        .filter(post::Column::DeletedAt.is_null())
        .join_rev(JoinType::InnerJoin, post_tag::Relation::Post.def())
        .filter(post_tag::Column::TagId.eq(tag_id))
        .order_by_desc(post::Column::CreatedAt)
        .all(db)
        .await?;
    load_relations(db, rows).await
}

pub async fn set_published(
    db: &DatabaseConnection,
    id: i32,
    publish: bool,
) -> Result<PostRecord> {
    let found = post::Entity::find_by_id(id)
        .filter(post::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or(Error::NotFound("post"))?;
    let mut model = found.into_active_model();
    model.status = Set(if publish {
        PostStatus::Published
    } else {
        PostStatus::Draft
    });
    model.updated_at = Set(Utc::now());
    model.update(db).await?;
    get_without_view_bump(db, id).await
}

async fn load_relations(
    db: &DatabaseConnection,
    posts: Vec<post::Model>,
) -> Result<Vec<PostRecord>> {
    let authors = posts
        .load_one(
            user::Entity::find().filter(user::Column::DeletedAt.is_null()),
            db,
        )
        .await?;
    let category_sets = posts
        .load_many_to_many(
            category::Entity::find().filter(category::Column::DeletedAt.is_null()),
            post_category::Entity,
            db,
        )
        .await?;
    let tag_sets = posts
        .load_many_to_many(
            tag::Entity::find().filter(tag::Column::DeletedAt.is_null()),
            post_tag::Entity,
            db,
        )
        .await?;

    Ok(posts
        .into_iter()
        .zip(authors)
        .zip(category_sets.into_iter().zip(tag_sets))
        .map(|((post, author), (categories, tags))| PostRecord {
            post,
            author,
            categories,
            tags,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing;

    fn content(title: &str, summary: &str) -> PostContent {
        PostContent {
            title: title.into(),
            content: "body".into(),
            summary: summary.into(),
            cover_image: String::new(),
        }
    }

    #[tokio::test]
    async fn create_silently_drops_unknown_association_ids() {
        let db = testing::db().await;
        let author = testing::seed_author(&db).await;
        let go = categories::create(&db, "Go", "d").await.unwrap();

        let record = create(&db, author.id, content("t", ""), &[go.id, 9999], &[8888])
            .await
            .unwrap();
        assert_eq!(record.categories.len(), 1);
        assert_eq!(record.categories[0].id, go.id);
        assert!(record.tags.is_empty());
        assert_eq!(record.post.status, PostStatus::Draft);
    }

    #[tokio::test]
    async fn update_with_invalid_id_changes_nothing() {
        let db = testing::db().await;
        let author = testing::seed_author(&db).await;
        let a = categories::create(&db, "A", "d").await.unwrap();
        let b = categories::create(&db, "B", "d").await.unwrap();
        let c = categories::create(&db, "C", "d").await.unwrap();
        let record = create(&db, author.id, content("old", ""), &[a.id, b.id], &[])
            .await
            .unwrap();

        let err = update(
            &db,
            record.post.id,
            content("new", ""),
            &[c.id, 9999],
            &[],
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        // Field updates rolled back along with the association replace.
        let unchanged = get_without_view_bump(&db, record.post.id).await.unwrap();
        assert_eq!(unchanged.post.title, "old");
        let mut ids: Vec<i32> = unchanged.categories.iter().map(|c| c.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn update_replaces_and_clears_associations() {
        let db = testing::db().await;
        let author = testing::seed_author(&db).await;
        let x = tags::create(&db, "x").await.unwrap();
        let y = tags::create(&db, "y").await.unwrap();
        let record = create(&db, author.id, content("t", ""), &[], &[x.id, y.id])
            .await
            .unwrap();

        let replaced = update(&db, record.post.id, content("t", ""), &[], &[x.id])
            .await
            .unwrap();
        assert_eq!(replaced.tags.len(), 1);
        assert_eq!(replaced.tags[0].id, x.id);

        let cleared = update(&db, record.post.id, content("t", ""), &[], &[])
            .await
            .unwrap();
        assert!(cleared.tags.is_empty());
    }

    #[tokio::test]
    async fn update_unknown_post_is_not_found() {
        let db = testing::db().await;
        let err = update(&db, 42, content("t", ""), &[], &[]).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn get_bumps_view_count_once_per_read() {
        let db = testing::db().await;
        let author = testing::seed_author(&db).await;
        let record = create(&db, author.id, content("t", ""), &[], &[])
            .await
            .unwrap();
        assert_eq!(record.post.view_count, 0);

        for expected in 1..=3 {
            let read = get(&db, record.post.id).await.unwrap();
            assert_eq!(read.post.view_count, expected);
        }
    }

    #[tokio::test]
    async fn delete_cascades_to_comments() {
        let db = testing::db().await;
        let author = testing::seed_author(&db).await;
        let record = create(&db, author.id, content("t", ""), &[], &[])
            .await
            .unwrap();
        comments::create(&db, author.id, record.post.id, "nice post")
            .await
            .unwrap();

        delete(&db, record.post.id).await.unwrap();
        assert!(matches!(
            get(&db, record.post.id).await.unwrap_err(),
            Error::NotFound(_)
        ));
        let (remaining, total) = comments::list_by_post(&db, record.post.id, Page::default())
            .await
            .unwrap();
        assert!(remaining.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn list_filters_title_or_summary() {
        let db = testing::db().await;
        let author = testing::seed_author(&db).await;
        create(&db, author.id, content("Learning Rust", ""), &[], &[])
            .await
            .unwrap();
        create(&db, author.id, content("Cooking", "rustic recipes"), &[], &[])
            .await
            .unwrap();
        create(&db, author.id, content("Gardening", ""), &[], &[])
            .await
            .unwrap();

        let (rows, total) = list(&db, Some("rust"), Page::default()).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(rows.len(), 2);

        // Total is independent of the pagination window.
        let (window, total) = list(&db, None, Page::new(Some(0), Some(2))).await.unwrap();
        assert_eq!(window.len(), 2);
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn posts_by_category_round_trip() {
        let db = testing::db().await;
        let author = testing::seed_author(&db).await;
        let go = categories::create(&db, "Go", "posts about go").await.unwrap();
        let record = create(&db, author.id, content("t", ""), &[go.id], &[])
            .await
            .unwrap();
        create(&db, author.id, content("other", ""), &[], &[])
            .await
            .unwrap();

        let found = by_category(&db, go.id).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].post.id, record.post.id);

        assert!(matches!(
            by_category(&db, 9999).await.unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn publish_flips_status() {
        let db = testing::db().await;
        let author = testing::seed_author(&db).await;
        let record = create(&db, author.id, content("t", ""), &[], &[])
            .await
            .unwrap();
        let published = set_published(&db, record.post.id, true).await.unwrap();
        assert_eq!(published.post.status, PostStatus::Published);
        let back = set_published(&db, record.post.id, false).await.unwrap();
        assert_eq!(back.post.status, PostStatus::Draft);
    }
}
