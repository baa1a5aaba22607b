use std::sync::Arc;

use chrono::Utc;
use poem_openapi::{payload::Json, Object, OpenApi};

use crate::{
    api::UserView,
    auth::{self, TokenAuth},
    store::users::{self, RegisterInput},
    AppState,
};

pub struct AuthApi {
    state: Arc<AppState>,
}

impl AuthApi {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

#[derive(Object)]
struct RegisterRequest {
    username: String,
    email: String,
    /// sha256 hex digest of the password; the server never sees a raw one.
    password: String,
}

#[derive(Object)]
struct RegisterResponse {
    id: i32,
    username: String,
    email: String,
}

#[derive(Object)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Object)]
struct TokenResponse {
    token: String,
}

#[OpenApi]
impl AuthApi {
    /// Create an account. Only allowed while the `enable_register` config
    /// value is exactly "true".
    #[oai(path = "/auth/register", method = "post")]
    async fn register(
        &self,
        req: Json<RegisterRequest>,
    ) -> poem::Result<Json<RegisterResponse>> {
        let req = req.0;
        let user = users::register(
            &self.state.db,
            RegisterInput {
                username: req.username,
                email: req.email,
                password: req.password,
            },
        )
        .await?;
        Ok(Json(RegisterResponse {
            id: user.id,
            username: user.username,
            email: user.email,
        }))
    }

    /// Exchange credentials for a bearer token.
    #[oai(path = "/auth/login", method = "post")]
    async fn login(&self, req: Json<LoginRequest>) -> poem::Result<Json<TokenResponse>> {
        let user = users::login(&self.state.db, &req.email, &req.password).await?;
        let token = auth::issue(&user, Utc::now(), &self.state.config)?;
        Ok(Json(TokenResponse { token }))
    }

    /// The calling user's own profile.
    #[oai(path = "/auth/profile", method = "get")]
    async fn profile(&self, auth: TokenAuth) -> poem::Result<Json<UserView>> {
        Ok(Json(auth.0.user.into()))
    }
}
