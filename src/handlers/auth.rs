use actix_web::{web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use crate::auth::{check_credentials, hash_password};
use crate::error::{ApiError, ApiResult};
use crate::models::{AuthResponse, LoginInput, PublicUser, RegisterInput, User};
use crate::repository::new_id;
use crate::state::AppState;

pub async fn register(state: web::Data<AppState>, input: web::Json<RegisterInput>) -> ApiResult<HttpResponse> {
    let input = input.into_inner().normalized();
    input.validate()?;

    if state.users.find_by_email(&input.email).await?.is_some() {
        return Err(ApiError::Conflict("User already exists".to_string()));
    }

    let password = input.password;
    let hashed = web::block(move || hash_password(&password)).await??;

    let user = state
        .users
        .insert(User {
            id: new_id(),
            name: input.name,
            email: input.email,
            password: hashed,
            created_at: Utc::now(),
        })
        .await?;

    let token = state.tokens.issue(&user.id)?;
    log::info!("registered user {}", user.id);
    Ok(HttpResponse::Created().json(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

pub async fn login(state: web::Data<AppState>, input: web::Json<LoginInput>) -> ApiResult<HttpResponse> {
    let LoginInput { email, password } = input.into_inner();
    let user = state.users.find_by_email(&email.trim().to_lowercase()).await?;

    let stored = user.as_ref().map(|u| u.password.clone());
    let matched = web::block(move || check_credentials(stored.as_deref(), &password)).await??;

    // unknown email and wrong password must look identical
    let user = match user {
        Some(user) if matched => user,
        _ => return Err(ApiError::Unauthorized("Invalid credentials".to_string())),
    };

    let token = state.tokens.issue(&user.id)?;
    Ok(HttpResponse::Ok().json(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}
