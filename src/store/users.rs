use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use validator::Validate;

use crate::{
    entities::user::{self, Role},
    error::{Error, Result},
    store::site_config,
};

/// Length of a sha256 hex digest; the only password form the server accepts.
pub const DIGEST_LEN: usize = 64;

pub fn is_hex_digest(value: &str) -> bool {
    value.len() == DIGEST_LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
}

#[derive(Debug, Clone, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 3, max = 64, message = "username must be 3-64 characters"))]
    pub username: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    pub password: String,
}

/// Create a user account. Gated on the `enable_register` config value being
/// exactly `"true"`; rejects duplicate active usernames and emails.
pub async fn register(db: &DatabaseConnection, input: RegisterInput) -> Result<user::Model> {
    match site_config::value(db, site_config::ENABLE_REGISTER).await? {
        Some(value) if value == "true" => {}
        _ => return Err(Error::RegistrationDisabled),
    }

    input
        .validate()
        .map_err(|err| Error::Validation(err.to_string()))?;
    if !is_hex_digest(&input.password) {
        return Err(Error::Validation(
            "password must be a 64-character hex digest".into(),
        ));
    }

    let taken = user::Entity::find()
        .filter(user::Column::DeletedAt.is_null())
        .filter(
            user::Column::Username
                .eq(input.username.as_str())
                .or(user::Column::Email.eq(input.email.as_str())),
        )
        .one(db)
        .await?;
    if taken.is_some() {
        return Err(Error::Conflict("username or email already exists".into()));
    }

    let now = Utc::now();
    let created = user::ActiveModel {
        username: Set(input.username),
        email: Set(input.email),
        password: Set(input.password),
        avatar: Set(String::new()),
        role: Set(Role::User),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    tracing::info!(user_id = created.id, "registered new user");
    Ok(created)
}

/// Verify credentials by exact digest comparison. Unknown email and wrong
/// digest are deliberately indistinguishable to the caller.
pub async fn login(db: &DatabaseConnection, email: &str, digest: &str) -> Result<user::Model> {
    let user = user::Entity::find()
        .filter(user::Column::DeletedAt.is_null())
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?;
    match user {
        Some(user) if user.password == digest => Ok(user),
        _ => Err(Error::InvalidCredentials),
    }
}

pub async fn find_active(db: &DatabaseConnection, id: i32) -> Result<Option<user::Model>> {
    Ok(user::Entity::find_by_id(id)
        .filter(user::Column::DeletedAt.is_null())
        .one(db)
        .await?)
}
