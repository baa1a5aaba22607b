use std::sync::Arc;

use poem_openapi::{
    param::{Path, Query},
    payload::Json,
    Object, OpenApi,
};

use crate::{
    api::{ok, OkResponse, TagCountView, TagView},
    auth::TokenAuth,
    store::{tags, Page},
    AppState,
};

pub struct TagsApi {
    state: Arc<AppState>,
}

impl TagsApi {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[derive(Object)]
struct TagList {
    data: Vec<TagCountView>,
    total: u64,
}

#[derive(Object)]
struct CreateTagRequest {
    name: String,
}

#[derive(Object)]
struct UpdateTagRequest {
    name: Option<String>,
}

#[OpenApi]
impl TagsApi {
    /// Tags with how many posts carry each.
    #[oai(path = "/tags", method = "get")]
    async fn list(
        &self,
        page: Query<Option<i64>>,
        size: Query<Option<i64>>,
    ) -> poem::Result<Json<TagList>> {
        let (rows, total) = tags::list(&self.state.db, Page::new(page.0, size.0)).await?;
        Ok(Json(TagList {
            data: rows.into_iter().map(Into::into).collect(),
            total,
        }))
    }

    #[oai(path = "/tags", method = "post")]
    async fn create(
        &self,
        _auth: TokenAuth,
        req: Json<CreateTagRequest>,
    ) -> poem::Result<Json<TagView>> {
        let created = tags::create(&self.state.db, &req.name).await?;
        Ok(Json(created.into()))
    }

    #[oai(path = "/tags/:id", method = "put")]
    async fn update(
        &self,
        _auth: TokenAuth,
        id: Path<i32>,
        req: Json<UpdateTagRequest>,
    ) -> poem::Result<Json<TagView>> {
        let updated = tags::update(&self.state.db, id.0, req.name.as_deref()).await?;
        Ok(Json(updated.into()))
    }

    #[oai(path = "/tags/:id", method = "delete")]
    async fn delete(&self, _auth: TokenAuth, id: Path<i32>) -> poem::Result<Json<OkResponse>> {
        tags::delete(&self.state.db, id.0).await?;
        Ok(Json(ok()))
    }
}
