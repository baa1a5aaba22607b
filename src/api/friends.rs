use std::sync::Arc;

use poem_openapi::{
    param::{Path, Query},
    payload::Json,
    Object, OpenApi,
};

use crate::{
    api::{ok, FriendsLinkView, OkResponse},
    auth::{require_admin, TokenAuth},
    store::{
        friends::{self, FriendsLinkFields},
        Page,
    },
    AppState,
};

pub struct FriendsApi {
    state: Arc<AppState>,
}

impl FriendsApi {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[derive(Object)]
struct FriendsLinkList {
    data: Vec<FriendsLinkView>,
    total: u64,
}

#[derive(Object)]
struct FriendsLinkRequest {
    #[oai(default)]
    title: String,
    #[oai(default)]
    link: String,
    #[oai(default)]
    avatar: String,
    #[oai(default)]
    description: String,
}

impl From<FriendsLinkRequest> for FriendsLinkFields {
    fn from(req: FriendsLinkRequest) -> Self {
        Self {
            title: req.title,
            link: req.link,
            avatar: req.avatar,
            description: req.description,
        }
    }
}

#[OpenApi]
impl FriendsApi {
    #[oai(path = "/friends", method = "get")]
    async fn list(
        &self,
        page: Query<Option<i64>>,
        size: Query<Option<i64>>,
    ) -> poem::Result<Json<FriendsLinkList>> {
        let (rows, total) = friends::list(&self.state.db, Page::new(page.0, size.0)).await?;
        Ok(Json(FriendsLinkList {
            data: rows.into_iter().map(Into::into).collect(),
            total,
        }))
    }

    /// Admin only.
    #[oai(path = "/friends", method = "post")]
    async fn create(
        &self,
        auth: TokenAuth,
        req: Json<FriendsLinkRequest>,
    ) -> poem::Result<Json<FriendsLinkView>> {
        require_admin(&auth.0)?;
        let created = friends::create(&self.state.db, req.0.into()).await?;
        Ok(Json(created.into()))
    }

    /// Full replacement of all fields.
    #[oai(path = "/friends/:id", method = "put")]
    async fn update(
        &self,
        _auth: TokenAuth,
        id: Path<i32>,
        req: Json<FriendsLinkRequest>,
    ) -> poem::Result<Json<FriendsLinkView>> {
        let updated = friends::update(&self.state.db, id.0, req.0.into()).await?;
        Ok(Json(updated.into()))
    }

    #[oai(path = "/friends/:id", method = "delete")]
    async fn delete(&self, _auth: TokenAuth, id: Path<i32>) -> poem::Result<Json<OkResponse>> {
        friends::delete(&self.state.db, id.0).await?;
        Ok(Json(ok()))
    }
}
