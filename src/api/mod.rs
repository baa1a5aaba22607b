//! HTTP surface: request validation, dispatch to the store, response
//! shaping. Endpoints fall into three authorization classes: public,
//! authenticated (any valid token) and admin-gated.

pub mod auth;
pub mod categories;
pub mod comments;
pub mod friends;
pub mod posts;
pub mod site_config;
pub mod tags;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use poem::{get, handler, middleware::Cors, Endpoint, EndpointExt, Route};
use poem_openapi::{Object, OpenApiService};
use sea_orm::ActiveEnum;

use crate::{
    entities::{category, comment, friends_link, site_config as config_entity, tag, user},
    store::posts::PostRecord,
    store::tags::TagWithCount,
    AppState,
};

pub fn app(state: Arc<AppState>) -> impl Endpoint {
    let api_service = OpenApiService::new(
        (
            auth::AuthApi::new(state.clone()),
            categories::CategoriesApi::new(state.clone()),
            tags::TagsApi::new(state.clone()),
            posts::PostsApi::new(state.clone()),
            comments::CommentsApi::new(state.clone()),
            friends::FriendsApi::new(state.clone()),
            site_config::ConfigApi::new(state.clone()),
        ),
        "easyblog",
        env!("CARGO_PKG_VERSION"),
    )
    .url_prefix("/api");
    let ui = api_service.swagger_ui();

    Route::new()
        .nest("/api", api_service)
        .nest("/docs", ui)
        .at("/health", get(health))
        .with(Cors::new())
        .data(state)
}

#[handler]
fn health() -> poem::web::Json<serde_json::Value> {
    poem::web::Json(serde_json::json!({ "status": "ok" }))
}

#[derive(Object)]
pub struct OkResponse {
    pub result: String,
}

pub fn ok() -> OkResponse {
    OkResponse {
        result: "ok".into(),
    }
}

#[derive(Object)]
pub struct UserView {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub avatar: String,
    pub role: String,
}

impl From<user::Model> for UserView {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            avatar: user.avatar,
            role: user.role.to_value(),
        }
    }
}

#[derive(Object)]
pub struct CategoryView {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<category::Model> for CategoryView {
    fn from(category: category::Model) -> Self {
        Self {
            id: category.id,
            name: category.name,
            description: category.description,
            created_at: category.created_at,
        }
    }
}

#[derive(Object)]
pub struct TagView {
    pub id: i32,
    pub name: String,
}

impl From<tag::Model> for TagView {
    fn from(tag: tag::Model) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
        }
    }
}

#[derive(Object)]
pub struct TagCountView {
    pub id: i32,
    pub name: String,
    pub post_count: i64,
}

impl From<TagWithCount> for TagCountView {
    fn from(tag: TagWithCount) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
            post_count: tag.post_count,
        }
    }
}

#[derive(Object)]
pub struct PostView {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub summary: String,
    pub cover_image: String,
    pub author_id: i32,
    pub status: String,
    pub view_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: Option<UserView>,
    pub categories: Vec<CategoryView>,
    pub tags: Vec<TagView>,
}

impl From<PostRecord> for PostView {
    fn from(record: PostRecord) -> Self {
        Self {
            id: record.post.id,
            title: record.post.title,
            content: record.post.content,
            summary: record.post.summary,
            cover_image: record.post.cover_image,
            author_id: record.post.author_id,
            status: record.post.status.to_value(),
            view_count: record.post.view_count,
            created_at: record.post.created_at,
            updated_at: record.post.updated_at,
            author: record.author.map(Into::into),
            categories: record.categories.into_iter().map(Into::into).collect(),
            tags: record.tags.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Object)]
pub struct CommentView {
    pub id: i32,
    pub post_id: i32,
    pub user_id: i32,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<comment::Model> for CommentView {
    fn from(comment: comment::Model) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            user_id: comment.user_id,
            content: comment.content,
            created_at: comment.created_at,
        }
    }
}

#[derive(Object)]
pub struct FriendsLinkView {
    pub id: i32,
    pub title: String,
    pub link: String,
    pub avatar: String,
    pub description: String,
}

impl From<friends_link::Model> for FriendsLinkView {
    fn from(link: friends_link::Model) -> Self {
        Self {
            id: link.id,
            title: link.title,
            link: link.link,
            avatar: link.avatar,
            description: link.description,
        }
    }
}

#[derive(Object)]
pub struct ConfigView {
    pub key: String,
    pub value: String,
}

impl From<config_entity::Model> for ConfigView {
    fn from(entry: config_entity::Model) -> Self {
        Self {
            key: entry.key,
            value: entry.value,
        }
    }
}
