use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    Extension, Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use crate::AppState;
use crate::constants::*;
use crate::database::Db;
use crate::error::{ApiError, ApiResult, ValidatedJson};
use crate::models::{
    LoginPayload, LoginResponse, MessageResponse, PublicUser, SignupPayload, UpdateProfilePayload,
    User,
};
use crate::token::TokenService;
use crate::utils::new_id;

/// Maps a users-table UNIQUE violation to the conflict naming the column
/// that collided.
fn unique_violation(err: &libsql::Error, email_message: &str) -> Option<ApiError> {
    let message = err.to_string();
    if message.contains("UNIQUE constraint failed: users.email") {
        Some(ApiError::conflict(email_message))
    } else if message.contains("UNIQUE constraint failed: users.username") {
        Some(ApiError::conflict(ERR_USERNAME_TAKEN))
    } else {
        None
    }
}

fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::internal(format!("password hashing failed: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> ApiResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| ApiError::internal(format!("failed to parse password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn validate_username(username: &str) -> ApiResult<()> {
    let length = username.chars().count();
    if !(MIN_USERNAME_LENGTH..=MAX_USERNAME_LENGTH).contains(&length) {
        return Err(ApiError::validation(format!(
            "Username must be between {} and {} characters",
            MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH
        )));
    }
    if username.starts_with(' ')
        || username.ends_with(' ')
        || !username
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == ' ')
    {
        return Err(ApiError::validation(
            "Username can only contain alphanumeric characters, spaces, underscores, and hyphens",
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> ApiResult<()> {
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ApiError::validation(format!(
            "Email must be at most {} characters",
            MAX_EMAIL_LENGTH
        )));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ApiError::validation("Email address is not valid")),
    }
}

fn extract_user_from_row(row: libsql::Row) -> ApiResult<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
    })
}

pub async fn find_user_by_id(db: &Db, user_id: &str) -> ApiResult<Option<User>> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT id, username, email, password_hash FROM users WHERE id = ?",
            [user_id],
        )
        .await?;

    match rows.next().await? {
        Some(row) => Ok(Some(extract_user_from_row(row)?)),
        None => Ok(None),
    }
}

pub async fn find_user_by_email(db: &Db, email: &str) -> ApiResult<Option<User>> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT id, username, email, password_hash FROM users WHERE email = ?",
            [email],
        )
        .await?;

    match rows.next().await? {
        Some(row) => Ok(Some(extract_user_from_row(row)?)),
        None => Ok(None),
    }
}

/// Registers a new user. Email collisions are reported before username ones.
pub async fn create_user(db: &Db, payload: &SignupPayload) -> ApiResult<PublicUser> {
    let username = payload.username.trim();
    let email = payload.email.trim();

    if username.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation(
            "Username, email and password are required",
        ));
    }
    validate_username(username)?;
    validate_email(email)?;
    if payload.password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::validation(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }

    let hash = hash_password(&payload.password)?;
    let id = new_id();
    let conn = db.write().await;

    if conn
        .query("SELECT id FROM users WHERE email = ?", [email])
        .await?
        .next()
        .await?
        .is_some()
    {
        return Err(ApiError::conflict(ERR_EMAIL_EXISTS));
    }
    if conn
        .query("SELECT id FROM users WHERE username = ?", [username])
        .await?
        .next()
        .await?
        .is_some()
    {
        return Err(ApiError::conflict(ERR_USERNAME_TAKEN));
    }

    conn.execute(
        "INSERT INTO users (id, username, email, password_hash) VALUES (?, ?, ?, ?)",
        (id.as_str(), username, email, hash.as_str()),
    )
    .await
    .map_err(|e| unique_violation(&e, ERR_EMAIL_EXISTS).unwrap_or_else(|| ApiError::from(e)))?;

    Ok(PublicUser {
        id,
        username: username.to_string(),
        email: email.to_string(),
    })
}

/// Checks credentials and issues a token. Unknown email and wrong password
/// fail identically.
pub async fn authenticate(
    db: &Db,
    tokens: &TokenService,
    payload: &LoginPayload,
) -> ApiResult<LoginResponse> {
    let email = payload.email.trim();
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    let user = match find_user_by_email(db, email).await? {
        Some(user) => user,
        None => {
            tracing::debug!("login attempt for unknown email");
            return Err(ApiError::Unauthorized(ERR_INVALID_CREDENTIALS.to_string()));
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "login attempt with wrong password");
        return Err(ApiError::Unauthorized(ERR_INVALID_CREDENTIALS.to_string()));
    }

    let token = tokens
        .issue(&user.id)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(LoginResponse {
        message: "Login successful".to_string(),
        token,
        user: user.into(),
    })
}

/// Changes username and email. The password hash is never touched here.
pub async fn save_profile(
    db: &Db,
    user_id: &str,
    payload: &UpdateProfilePayload,
) -> ApiResult<PublicUser> {
    let username = payload.username.trim();
    let email = payload.email.trim();

    if username.is_empty() || email.is_empty() {
        return Err(ApiError::validation("Username and email are required"));
    }
    validate_username(username)?;
    validate_email(email)?;

    let conn = db.write().await;

    if conn
        .query(
            "SELECT id FROM users WHERE username = ? AND id != ?",
            [username, user_id],
        )
        .await?
        .next()
        .await?
        .is_some()
    {
        return Err(ApiError::conflict(ERR_USERNAME_TAKEN));
    }
    if conn
        .query(
            "SELECT id FROM users WHERE email = ? AND id != ?",
            [email, user_id],
        )
        .await?
        .next()
        .await?
        .is_some()
    {
        return Err(ApiError::conflict(ERR_EMAIL_IN_USE));
    }

    let affected = conn
        .execute(
            "UPDATE users SET username = ?, email = ? WHERE id = ?",
            [username, email, user_id],
        )
        .await
        .map_err(|e| unique_violation(&e, ERR_EMAIL_IN_USE).unwrap_or_else(|| ApiError::from(e)))?;

    if affected == 0 {
        return Err(ApiError::not_found("User not found"));
    }

    Ok(PublicUser {
        id: user_id.to_string(),
        username: username.to_string(),
        email: email.to_string(),
    })
}

fn bearer_token(headers: &HeaderMap) -> ApiResult<String> {
    let no_token = || ApiError::Unauthenticated(ERR_NO_TOKEN.to_string());

    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(no_token)?
        .to_str()
        .map_err(|_| no_token())?;

    match value.trim().split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim().to_string())
        }
        _ => Err(no_token()),
    }
}

/// Gate in front of every protected route: requires a valid bearer token
/// whose user still exists, and exposes that user as `Extension<PublicUser>`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = bearer_token(request.headers())?;

    let user_id = state.tokens.verify(&token).map_err(|e| {
        tracing::debug!("token verification failed: {}", e);
        ApiError::Unauthenticated(ERR_TOKEN_FAILED.to_string())
    })?;

    let user = find_user_by_id(&state.db, &user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthenticated(ERR_USER_GONE.to_string()))?;

    request.extensions_mut().insert(PublicUser::from(user));
    Ok(next.run(request).await)
}

pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SignupPayload>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let user = create_user(&state.db, &payload).await?;
    tracing::info!(user_id = %user.id, "user signed up");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Signup successful")),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginPayload>,
) -> ApiResult<(StatusCode, Json<LoginResponse>)> {
    let response = authenticate(&state.db, &state.tokens, &payload).await?;
    Ok((StatusCode::OK, Json(response)))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<PublicUser>,
) -> ApiResult<(StatusCode, Json<PublicUser>)> {
    let user = find_user_by_id(&state.db, &user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok((StatusCode::OK, Json(user.into())))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<PublicUser>,
    ValidatedJson(payload): ValidatedJson<UpdateProfilePayload>,
) -> ApiResult<(StatusCode, Json<PublicUser>)> {
    let updated = save_profile(&state.db, &user.id, &payload).await?;
    Ok((StatusCode::OK, Json(updated)))
}
