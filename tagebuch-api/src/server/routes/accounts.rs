use crate::server::{
    Result, ServerError, ServerRouter,
    extract::Json,
    forms::{FieldErrors, FormErrorBody, unprocessable, validated},
};
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::routing::{RouterExt, TypedPath};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tagebuch_common::model::{
    auth::{AuthToken, PasswordHash, PositiveDuration},
    user::{Password, Username},
};
use tagebuch_db::client::DbClient;

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_post(sign_up).typed_post(log_in)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/signup", rejection(ServerError))]
struct SignUpPath();

#[derive(Clone, Eq, PartialEq, Debug, Default, Deserialize)]
#[serde(default)]
struct SignUpForm {
    username: String,
    password: String,
}

async fn sign_up(
    _: SignUpPath,
    State(db): State<Arc<DbClient>>,
    Json(form): Json<SignUpForm>,
) -> Result<Response> {
    let mut errors = FieldErrors::new();
    let username = validated(&mut errors, "username", Username::new(form.username));
    let password = validated(&mut errors, "password", Password::new(form.password));

    let (Some(username), Some(password)) = (username, password) else {
        return Ok(unprocessable(FormErrorBody { errors }));
    };

    let password_hash = PasswordHash::from_password(&password)?;

    match db.create_user(&username, &password_hash).await {
        Ok(_) => Ok(Redirect::to("/login").into_response()),
        Err(taken) if taken.is_unique_violation() => {
            let mut errors = FieldErrors::new();
            errors.push("username", "A user with that username already exists");

            Ok(unprocessable(FormErrorBody { errors }))
        }
        Err(error) => Err(error.into()),
    }
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/login", rejection(ServerError))]
struct LogInPath();

#[derive(Clone, Eq, PartialEq, Debug, Default, Deserialize)]
#[serde(default)]
struct LogInForm {
    username: String,
    password: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Serialize)]
struct TokenResponse {
    token: String,
}

/// Issues a fresh bearer token. A wrong username and a wrong password are
/// indistinguishable to the caller.
async fn log_in(
    _: LogInPath,
    State(db): State<Arc<DbClient>>,
    State(token_expiry): State<Option<PositiveDuration>>,
    Json(form): Json<LogInForm>,
) -> Result<Json<TokenResponse>> {
    let username = Username::new(form.username).map_err(|_| ServerError::InvalidCredentials)?;
    let password = Password::new(form.password).map_err(|_| ServerError::InvalidCredentials)?;

    let (user, password_hash) = db
        .fetch_credentials(&username)
        .await?
        .ok_or(ServerError::InvalidCredentials)?;

    if !password_hash.verify(&password) {
        return Err(ServerError::InvalidCredentials);
    }

    let token = AuthToken::generate_random(user.id);
    db.create_auth(user.id, &token.hash()?, token_expiry).await?;

    Ok(Json(TokenResponse {
        token: token.as_token_str(),
    }))
}
