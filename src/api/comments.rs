use std::sync::Arc;

use poem_openapi::{
    param::{Path, Query},
    payload::Json,
    Object, OpenApi,
};

use crate::{
    api::{ok, CommentView, OkResponse},
    auth::TokenAuth,
    store::{comments, Page},
    AppState,
};

pub struct CommentsApi {
    state: Arc<AppState>,
}

impl CommentsApi {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[derive(Object)]
struct CommentList {
    items: Vec<CommentView>,
    total: u64,
}

#[derive(Object)]
struct CreateCommentRequest {
    post_id: i32,
    content: String,
}

#[OpenApi]
impl CommentsApi {
    /// Comments on one post, newest first.
    #[oai(path = "/posts/:id/comments", method = "get")]
    async fn list_by_post(
        &self,
        id: Path<i32>,
        page: Query<Option<i64>>,
        size: Query<Option<i64>>,
    ) -> poem::Result<Json<CommentList>> {
        let (rows, total) =
            comments::list_by_post(&self.state.db, id.0, Page::new(page.0, size.0)).await?;
        Ok(Json(CommentList {
            items: rows.into_iter().map(Into::into).collect(),
            total,
        }))
    }

    #[oai(path = "/comments", method = "post")]
    async fn create(
        &self,
        auth: TokenAuth,
        req: Json<CreateCommentRequest>,
    ) -> poem::Result<Json<CommentView>> {
        let created =
            comments::create(&self.state.db, auth.0.user.id, req.post_id, &req.content).await?;
        Ok(Json(created.into()))
    }

    #[oai(path = "/comments/:id", method = "delete")]
    async fn delete(&self, _auth: TokenAuth, id: Path<i32>) -> poem::Result<Json<OkResponse>> {
        comments::delete(&self.state.db, id.0).await?;
        Ok(Json(ok()))
    }
}
