use std::sync::Arc;

use poem_openapi::{
    param::{Path, Query},
    payload::Json,
    Object, OpenApi,
};

use crate::{
    api::{ok, OkResponse, PostView},
    auth::TokenAuth,
    store::{
        posts::{self, PostContent},
        Page,
    },
    AppState,
};

pub struct PostsApi {
    state: Arc<AppState>,
}

impl PostsApi {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[derive(Object)]
struct PostList {
    items: Vec<PostView>,
    total: u64,
}

/// Shared by create and update. Omitted id lists mean "no associations"
/// on create and "clear the association" on update.
#[derive(Object)]
struct PostRequest {
    title: String,
    content: String,
    #[oai(default)]
    summary: String,
    #[oai(default)]
    cover_image: String,
    #[oai(default)]
    category_ids: Vec<i32>,
    #[oai(default)]
    tag_ids: Vec<i32>,
}

#[derive(Object)]
struct PublishRequest {
    publish: bool,
}

impl PostRequest {
    fn into_parts(self) -> (PostContent, Vec<i32>, Vec<i32>) {
        (
            PostContent {
                title: self.title,
                content: self.content,
                summary: self.summary,
                cover_image: self.cover_image,
            },
            self.category_ids,
            self.tag_ids,
        )
    }
}

#[OpenApi]
impl PostsApi {
    /// List posts, newest first, optionally filtered by a free-text `q`
    /// matched against title or summary.
    #[oai(path = "/posts", method = "get")]
    async fn list(
        &self,
        q: Query<Option<String>>,
        page: Query<Option<i64>>,
        size: Query<Option<i64>>,
    ) -> poem::Result<Json<PostList>> {
        let (rows, total) =
            posts::list(&self.state.db, q.as_deref(), Page::new(page.0, size.0)).await?;
        Ok(Json(PostList {
            items: rows.into_iter().map(Into::into).collect(),
            total,
        }))
    }

    /// Fetch one post; each successful read bumps its view counter.
    #[oai(path = "/posts/:id", method = "get")]
    async fn get(&self, id: Path<i32>) -> poem::Result<Json<PostView>> {
        Ok(Json(posts::get(&self.state.db, id.0).await?.into()))
    }

    #[oai(path = "/posts/category/:id", method = "get")]
    async fn by_category(&self, id: Path<i32>) -> poem::Result<Json<Vec<PostView>>> {
        let rows = posts::by_category(&self.state.db, id.0).await?;
        Ok(Json(rows.into_iter().map(Into::into).collect()))
    }

    #[oai(path = "/posts/tag/:id", method = "get")]
    async fn by_tag(&self, id: Path<i32>) -> poem::Result<Json<Vec<PostView>>> {
        let rows = posts::by_tag(&self.state.db, id.0).await?;
        Ok(Json(rows.into_iter().map(Into::into).collect()))
    }

    /// Create a draft owned by the caller. Unresolved category/tag ids are
    /// dropped silently.
    #[oai(path = "/posts", method = "post")]
    async fn create(
        &self,
        auth: TokenAuth,
        req: Json<PostRequest>,
    ) -> poem::Result<Json<PostView>> {
        let (content, category_ids, tag_ids) = req.0.into_parts();
        let record = posts::create(
            &self.state.db,
            auth.0.user.id,
            content,
            &category_ids,
            &tag_ids,
        )
        .await?;
        Ok(Json(record.into()))
    }

    /// Atomically update fields and replace both association sets; any
    /// unresolved id rejects the whole update.
    #[oai(path = "/posts/:id", method = "put")]
    async fn update(
        &self,
        _auth: TokenAuth,
        id: Path<i32>,
        req: Json<PostRequest>,
    ) -> poem::Result<Json<PostView>> {
        let (content, category_ids, tag_ids) = req.0.into_parts();
        let record = posts::update(&self.state.db, id.0, content, &category_ids, &tag_ids).await?;
        Ok(Json(record.into()))
    }

    /// Delete the post and all comments referencing it.
    #[oai(path = "/posts/:id", method = "delete")]
    async fn delete(&self, _auth: TokenAuth, id: Path<i32>) -> poem::Result<Json<OkResponse>> {
        posts::delete(&self.state.db, id.0).await?;
        Ok(Json(ok()))
    }

    #[oai(path = "/posts/:id/publish", method = "put")]
    async fn publish(
        &self,
        _auth: TokenAuth,
        id: Path<i32>,
        req: Json<PublishRequest>,
    ) -> poem::Result<Json<PostView>> {
        let record = posts::set_published(&self.state.db, id.0, req.publish).await?;
        Ok(Json(record.into()))
    }
}
