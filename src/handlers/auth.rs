use crate::error::AppResult;
use crate::handlers::ApiJson;
use crate::state::AppState;
use crate::webauthn::types::*;
use crate::webauthn::{authentication, registration};
use axum::{extract::State, Json};
use serde_json::{json, Value};
use tower_sessions::Session;

/// Session key holding the authenticated user's id.
pub const USER_ID_KEY: &str = "user_id";

// Registration endpoints

pub async fn register_options(
    session: Session,
    State(state): State<AppState>,
) -> AppResult<Json<RegistrationOptionsResponse>> {
    let session_user: Option<String> = session.get(USER_ID_KEY).await?;

    let (options, user_id) =
        registration::start_registration(&state, session_user.as_deref()).await?;

    Ok(Json(RegistrationOptionsResponse { options, user_id }))
}

/// A verified registration also signs the user in, so the client can go
/// straight to the dashboard.
pub async fn register_verify(
    session: Session,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegistrationVerifyRequest>,
) -> AppResult<Json<Value>> {
    let user_id = registration::finish_registration(&state, &req.user_id, &req.response).await?;

    establish_session(&session, &user_id).await?;

    Ok(Json(json!({ "ok": true })))
}

// Login endpoints

pub async fn login_options(State(state): State<AppState>) -> AppResult<Json<LoginOptionsResponse>> {
    let (options, challenge_id) = authentication::start_authentication(&state).await?;

    Ok(Json(LoginOptionsResponse {
        options,
        challenge_id,
    }))
}

pub async fn login_verify(
    session: Session,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginVerifyRequest>,
) -> AppResult<Json<Value>> {
    let user_id =
        authentication::finish_authentication(&state, &req.challenge_id, &req.response).await?;

    establish_session(&session, &user_id).await?;

    Ok(Json(json!({
        "ok": true,
        "userId": user_id
    })))
}

// Session endpoints

pub async fn logout(session: Session) -> AppResult<Json<Value>> {
    session.delete().await?;

    Ok(Json(json!({ "ok": true })))
}

pub async fn session_info(session: Session) -> AppResult<Json<Value>> {
    let user_id: Option<String> = session.get(USER_ID_KEY).await?;

    match user_id {
        Some(id) => Ok(Json(json!({
            "authenticated": true,
            "userId": id
        }))),
        None => Ok(Json(json!({
            "authenticated": false
        }))),
    }
}

/// New session id on every sign-in, so a pre-login id cannot be fixated.
async fn establish_session(session: &Session, user_id: &str) -> AppResult<()> {
    session.cycle_id().await?;
    session.insert(USER_ID_KEY, user_id).await?;

    Ok(())
}
