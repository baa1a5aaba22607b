use std::sync::Arc;

use poem_openapi::{param::Query, payload::Json, Object, OpenApi};

use crate::{
    api::{ok, ConfigView, OkResponse},
    auth::TokenAuth,
    store::{site_config, Page},
    AppState,
};

pub struct ConfigApi {
    state: Arc<AppState>,
}

impl ConfigApi {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[derive(Object)]
struct ConfigList {
    data: Vec<ConfigView>,
    total: u64,
}

#[derive(Object)]
struct CreateConfigRequest {
    key: String,
    value: String,
}

#[derive(Object)]
struct UpdateConfigRequest {
    value: String,
}

#[OpenApi]
impl ConfigApi {
    /// Look up one config entry by key; public so the frontend can read
    /// display settings like `sites_name`.
    #[oai(path = "/config", method = "get")]
    async fn get(&self, key: Query<String>) -> poem::Result<Json<ConfigView>> {
        Ok(Json(site_config::get(&self.state.db, &key).await?.into()))
    }

    #[oai(path = "/config/all", method = "get")]
    async fn list(
        &self,
        _auth: TokenAuth,
        page: Query<Option<i64>>,
        size: Query<Option<i64>>,
    ) -> poem::Result<Json<ConfigList>> {
        let (rows, total) = site_config::list(&self.state.db, Page::new(page.0, size.0)).await?;
        Ok(Json(ConfigList {
            data: rows.into_iter().map(Into::into).collect(),
            total,
        }))
    }

    #[oai(path = "/config", method = "post")]
    async fn create(
        &self,
        _auth: TokenAuth,
        req: Json<CreateConfigRequest>,
    ) -> poem::Result<Json<ConfigView>> {
        let created = site_config::create(&self.state.db, &req.key, &req.value).await?;
        Ok(Json(created.into()))
    }

    #[oai(path = "/config", method = "put")]
    async fn update(
        &self,
        _auth: TokenAuth,
        key: Query<String>,
        req: Json<UpdateConfigRequest>,
    ) -> poem::Result<Json<ConfigView>> {
        let updated = site_config::update(&self.state.db, &key, &req.value).await?;
        Ok(Json(updated.into()))
    }

    #[oai(path = "/config", method = "delete")]
    async fn delete(
        &self,
        _auth: TokenAuth,
        key: Query<String>,
    ) -> poem::Result<Json<OkResponse>> {
        site_config::delete(&self.state.db, &key).await?;
        Ok(Json(ok()))
    }
}
