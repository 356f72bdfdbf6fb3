use crate::{
    application::usecases::auth::AuthUseCase,
    domain::{
        repositories::users::UserRepository,
        value_objects::users::{LoginModel, RegisterUserModel},
    },
    infrastructure::{
        axum_http::{
            auth::{self, AuthUser},
            error_responses,
        },
        postgres::{postgres_connection::PgPoolSquad, repositories::users::UserPostgres},
    },
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use cookie::{Cookie, SameSite};
use std::sync::Arc;
use tracing::{error, warn};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let user_repository = UserPostgres::new(Arc::clone(&db_pool));
    let auth_usecase = AuthUseCase::new(Arc::new(user_repository));

    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .with_state(Arc::new(auth_usecase))
}

pub async fn signup<U>(
    State(auth_usecase): State<Arc<AuthUseCase<U>>>,
    Json(register_user_model): Json<RegisterUserModel>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
{
    match auth_usecase.signup(register_user_model).await {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(err) => {
            warn!(error = %err, "auth: signup rejected");
            error_responses::usecase_error_response(err.status_code(), err)
        }
    }
}

pub async fn login<U>(
    State(auth_usecase): State<Arc<AuthUseCase<U>>>,
    jar: CookieJar,
    Json(login_model): Json<LoginModel>,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
{
    match auth_usecase.login(login_model).await {
        Ok(user) => match auth::issue_session_token(user.id) {
            Ok(token) => {
                let cookie = Cookie::build((auth::SESSION_COOKIE, token))
                    .path("/")
                    .http_only(true)
                    .same_site(SameSite::Strict)
                    .build();

                (jar.add(cookie), Json(user)).into_response()
            }
            Err(err) => {
                error!(user_id = %user.id, error = %err, "auth: failed to issue session token");
                error_responses::usecase_error_response(StatusCode::INTERNAL_SERVER_ERROR, err)
            }
        },
        Err(err) => {
            warn!(error = %err, "auth: login rejected");
            error_responses::usecase_error_response(err.status_code(), err)
        }
    }
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(auth::SESSION_COOKIE).path("/"));

    (jar, StatusCode::NO_CONTENT).into_response()
}

pub async fn me<U>(
    State(auth_usecase): State<Arc<AuthUseCase<U>>>,
    AuthUser { user_id }: AuthUser,
) -> impl IntoResponse
where
    U: UserRepository + Send + Sync + 'static,
{
    match auth_usecase.me(user_id).await {
        Ok(user) => Json(user).into_response(),
        Err(err) => {
            warn!(%user_id, error = %err, "auth: failed to load current user");
            error_responses::usecase_error_response(err.status_code(), err)
        }
    }
}
