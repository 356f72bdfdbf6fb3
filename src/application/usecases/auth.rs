use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use chrono::Utc;
use rand::rngs::OsRng;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{
    entities::users::RegisterUserEntity,
    repositories::users::UserRepository,
    value_objects::users::{LoginModel, RegisterUserModel},
};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username and password required")]
    MissingCredentials,
    #[error("User already exists")]
    UsernameTaken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("User not found")]
    UserNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            AuthError::MissingCredentials => StatusCode::BAD_REQUEST,
            AuthError::UsernameTaken => StatusCode::CONFLICT,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Clone, Serialize)]
pub struct UserDto {
    pub id: Uuid,
    pub username: String,
}

pub struct AuthUseCase<U>
where
    U: UserRepository + Send + Sync + 'static,
{
    user_repo: Arc<U>,
}

impl<U> AuthUseCase<U>
where
    U: UserRepository + Send + Sync + 'static,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    pub async fn signup(&self, register_user_model: RegisterUserModel) -> UseCaseResult<UserDto> {
        let username = register_user_model.username.trim().to_string();
        if username.is_empty() || register_user_model.password.is_empty() {
            warn!("auth: signup rejected for missing credentials");
            return Err(AuthError::MissingCredentials);
        }

        info!(username = %username, "auth: signup requested");

        let existing = self
            .user_repo
            .find_by_username(username.clone())
            .await
            .map_err(|err| {
                error!(username = %username, db_error = ?err, "auth: failed to look up username");
                AuthError::Internal(err)
            })?;
        if existing.is_some() {
            warn!(username = %username, "auth: username already registered");
            return Err(AuthError::UsernameTaken);
        }

        let password_hash = hash_password(&register_user_model.password)?;

        let user = self
            .user_repo
            .register(RegisterUserEntity {
                id: Uuid::new_v4(),
                username,
                password_hash,
                created_at: Utc::now(),
            })
            .await
            .map_err(|err| {
                error!(db_error = ?err, "auth: failed to register user");
                AuthError::Internal(err)
            })?;

        info!(user_id = %user.id, "auth: user registered");

        Ok(UserDto {
            id: user.id,
            username: user.username,
        })
    }

    pub async fn login(&self, login_model: LoginModel) -> UseCaseResult<UserDto> {
        if login_model.username.is_empty() || login_model.password.is_empty() {
            warn!("auth: login rejected for missing credentials");
            return Err(AuthError::MissingCredentials);
        }

        info!(username = %login_model.username, "auth: login requested");

        let user = self
            .user_repo
            .find_by_username(login_model.username.clone())
            .await
            .map_err(|err| {
                error!(
                    username = %login_model.username,
                    db_error = ?err,
                    "auth: failed to look up user"
                );
                AuthError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(username = %login_model.username, "auth: unknown username");
                AuthError::InvalidCredentials
            })?;

        if verify_password(&login_model.password, &user.password_hash).is_err() {
            warn!(user_id = %user.id, "auth: password verification failed");
            return Err(AuthError::InvalidCredentials);
        }

        info!(user_id = %user.id, "auth: login succeeded");

        Ok(UserDto {
            id: user.id,
            username: user.username,
        })
    }

    pub async fn me(&self, user_id: Uuid) -> UseCaseResult<UserDto> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "auth: failed to load user");
                AuthError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(%user_id, "auth: user not found");
                AuthError::UserNotFound
            })?;

        Ok(UserDto {
            id: user.id,
            username: user.username,
        })
    }
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthError::Internal(anyhow::anyhow!("failed to hash password: {}", err)))
}

fn verify_password(
    password: &str,
    password_hash: &str,
) -> Result<(), argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(password_hash)?;
    Argon2::default().verify_password(password.as_bytes(), &parsed_hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        entities::users::UserEntity, repositories::users::MockUserRepository,
    };
    use mockall::predicate::eq;

    fn sample_user(username: &str, password_hash: String) -> UserEntity {
        UserEntity {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn signup_rejects_empty_credentials() {
        let user_repo = MockUserRepository::new();
        let usecase = AuthUseCase::new(Arc::new(user_repo));

        let result = usecase
            .signup(RegisterUserModel {
                username: "   ".to_string(),
                password: "secret".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::MissingCredentials)));
    }

    #[tokio::test]
    async fn signup_rejects_taken_username() {
        let mut user_repo = MockUserRepository::new();

        let user = sample_user("alice", "hash".to_string());
        user_repo
            .expect_find_by_username()
            .with(eq("alice".to_string()))
            .returning(move |_| {
                let user = user.clone();
                Box::pin(async move { Ok(Some(user)) })
            });

        let usecase = AuthUseCase::new(Arc::new(user_repo));
        let result = usecase
            .signup(RegisterUserModel {
                username: "alice".to_string(),
                password: "secret".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::UsernameTaken)));
    }

    #[tokio::test]
    async fn signup_stores_an_argon2_hash_not_the_password() {
        let mut user_repo = MockUserRepository::new();

        user_repo
            .expect_find_by_username()
            .returning(|_| Box::pin(async { Ok(None) }));
        user_repo
            .expect_register()
            .withf(|entity| {
                entity.username == "alice"
                    && entity.password_hash != "secret"
                    && entity.password_hash.starts_with("$argon2")
            })
            .returning(|entity| {
                let user = UserEntity {
                    id: entity.id,
                    username: entity.username,
                    password_hash: entity.password_hash,
                    created_at: entity.created_at,
                };
                Box::pin(async move { Ok(user) })
            });

        let usecase = AuthUseCase::new(Arc::new(user_repo));
        let user = usecase
            .signup(RegisterUserModel {
                username: "alice".to_string(),
                password: "secret".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn login_rejects_unknown_user() {
        let mut user_repo = MockUserRepository::new();

        user_repo
            .expect_find_by_username()
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = AuthUseCase::new(Arc::new(user_repo));
        let result = usecase
            .login(LoginModel {
                username: "ghost".to_string(),
                password: "secret".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn login_rejects_wrong_password() {
        let mut user_repo = MockUserRepository::new();

        let user = sample_user("alice", hash_password("correct horse").unwrap());
        user_repo
            .expect_find_by_username()
            .returning(move |_| {
                let user = user.clone();
                Box::pin(async move { Ok(Some(user)) })
            });

        let usecase = AuthUseCase::new(Arc::new(user_repo));
        let result = usecase
            .login(LoginModel {
                username: "alice".to_string(),
                password: "battery staple".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn login_accepts_valid_password() {
        let mut user_repo = MockUserRepository::new();

        let user = sample_user("alice", hash_password("correct horse").unwrap());
        let expected_id = user.id;
        user_repo
            .expect_find_by_username()
            .returning(move |_| {
                let user = user.clone();
                Box::pin(async move { Ok(Some(user)) })
            });

        let usecase = AuthUseCase::new(Arc::new(user_repo));
        let user = usecase
            .login(LoginModel {
                username: "alice".to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(user.id, expected_id);
    }

    #[tokio::test]
    async fn me_rejects_unknown_user() {
        let mut user_repo = MockUserRepository::new();

        user_repo
            .expect_find_by_id()
            .returning(|_| Box::pin(async { Ok(None) }));

        let usecase = AuthUseCase::new(Arc::new(user_repo));
        let result = usecase.me(Uuid::new_v4()).await;

        assert!(matches!(result, Err(AuthError::UserNotFound)));
    }
}
