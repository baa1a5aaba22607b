use std::sync::Arc;

use poem_openapi::{
    param::{Path, Query},
    payload::Json,
    Object, OpenApi,
};

use crate::{
    api::{ok, CategoryView, OkResponse},
    auth::TokenAuth,
    store::{categories, Page},
    AppState,
};

pub struct CategoriesApi {
    state: Arc<AppState>,
}

impl CategoriesApi {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[derive(Object)]
struct CategoryList {
    data: Vec<CategoryView>,
    total: u64,
}

#[derive(Object)]
struct CreateCategoryRequest {
    name: String,
    description: String,
}

#[derive(Object)]
struct UpdateCategoryRequest {
    name: Option<String>,
    description: Option<String>,
}

#[OpenApi]
impl CategoriesApi {
    #[oai(path = "/categories", method = "get")]
    async fn list(
        &self,
        page: Query<Option<i64>>,
        size: Query<Option<i64>>,
    ) -> poem::Result<Json<CategoryList>> {
        let (rows, total) = categories::list(&self.state.db, Page::new(page.0, size.0)).await?;
        Ok(Json(CategoryList {
            data: rows.into_iter().map(Into::into).collect(),
            total,
        }))
    }

    #[oai(path = "/categories", method = "post")]
    async fn create(
        &self,
        _auth: TokenAuth,
        req: Json<CreateCategoryRequest>,
    ) -> poem::Result<Json<CategoryView>> {
        let created = categories::create(&self.state.db, &req.name, &req.description).await?;
        Ok(Json(created.into()))
    }

    #[oai(path = "/categories/:id", method = "put")]
    async fn update(
        &self,
        _auth: TokenAuth,
        id: Path<i32>,
        req: Json<UpdateCategoryRequest>,
    ) -> poem::Result<Json<CategoryView>> {
        let updated = categories::update(
            &self.state.db,
            id.0,
            req.name.as_deref(),
            req.description.as_deref(),
        )
        .await?;
        Ok(Json(updated.into()))
    }

    #[oai(path = "/categories/:id", method = "delete")]
    async fn delete(&self, _auth: TokenAuth, id: Path<i32>) -> poem::Result<Json<OkResponse>> {
        categories::delete(&self.state.db, id.0).await?;
        Ok(Json(ok()))
    }
}
