use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::{WithRejection, cookie::CookieJar};

use crate::{
    AppState,
    error::AppError,
    infrastructure::SessionClaims,
    middleware::CurrentUser,
    utils::{hash_password, removal_cookie, session_cookie, verify_password},
};

use super::model::{
    CheckSetupResponse, LoginRequest, LoginResponse, MessageResponse, RegisterRequest,
    RegisterResponse, RegisteredUser, User,
};

#[axum::debug_handler(state = AppState)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, AppError>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    if let Err(e) = req.validate() {
        tracing::info!("Login validation failed: {}", e);
        return Err(e);
    }

    let user = match User::find_by_username(&state.pool, &req.username).await? {
        Some(user) => user,
        None => {
            tracing::info!(username = %req.username, "Login attempt for non-existent user");
            return Err(AppError::InvalidCredentials);
        }
    };

    if !user.is_active {
        tracing::warn!(
            username = %user.username,
            user_id = %user.id,
            "Login attempt for disabled account"
        );
        return Err(AppError::Forbidden("Account is disabled".to_string()));
    }

    if !verify_password(&req.password, &user.password_hash)? {
        tracing::info!(username = %user.username, "Invalid password attempt");
        return Err(AppError::InvalidCredentials);
    }

    let token = state.codec.issue(&user.claims()?)?;

    tracing::info!(
        username = %user.username,
        user_id = %user.id,
        "User logged in successfully"
    );

    let jar = jar.add(session_cookie(token, state.config.secure_cookies()));
    Ok((
        jar,
        Json(LoginResponse {
            user: user.summary()?,
        }),
    ))
}

#[axum::debug_handler(state = AppState)]
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let new_user = match req.validate() {
        Ok(new_user) => new_user,
        Err(e) => {
            tracing::info!("Registration validation failed: {}", e);
            return Err(e);
        }
    };

    if User::exists_with(&state.pool, &new_user.username, &new_user.email).await? {
        tracing::info!(
            username = %new_user.username,
            email = %new_user.email,
            "Registration attempt with existing credentials"
        );
        return Err(AppError::Duplicate(
            "Username or email already exists".to_string(),
        ));
    }

    let password_hash = hash_password(&new_user.password)?;
    let user = match User::create(&state.pool, &new_user, &password_hash).await {
        Ok(user) => user,
        // 并发注册时由唯一约束兜底
        Err(e) if e.to_string().contains("unique constraint") => {
            return Err(AppError::Duplicate(
                "Username or email already exists".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        username = %user.username,
        user_id = %user.id,
        role = %new_user.role,
        "User registered successfully"
    );

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created successfully",
            user: RegisteredUser {
                id: user.id.to_string(),
                username: user.username.clone(),
                email: user.email.clone(),
                role: user.role()?,
                created_at: user.created_at,
            },
        }),
    ))
}

#[axum::debug_handler(state = AppState)]
pub async fn check_setup(
    State(state): State<AppState>,
) -> Result<Json<CheckSetupResponse>, AppError> {
    let count = User::count(&state.pool).await?;
    Ok(Json(CheckSetupResponse {
        has_users: count > 0,
    }))
}

#[axum::debug_handler(state = AppState)]
pub async fn logout(
    CurrentUser(claims): CurrentUser,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    tracing::info!(username = %claims.username, user_id = %claims.user_id, "User logged out");

    (
        jar.remove(removal_cookie()),
        Json(MessageResponse {
            message: "Logged out successfully",
        }),
    )
}

/// 返回当前会话中的用户信息
#[axum::debug_handler(state = AppState)]
pub async fn me(CurrentUser(claims): CurrentUser) -> Json<SessionClaims> {
    Json(claims)
}
