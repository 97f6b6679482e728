//! Signup and profile endpoints

use api_types::user::{PasswordChange, Profile as ProfileView, ProfileUpdate, SignUp};
use axum::{Extension, Json, extract::State, http::StatusCode};
use engine::{NewUser, Profile};

use crate::{ServerError, server::ServerState};

fn to_view(profile: Profile) -> ProfileView {
    ProfileView {
        username: profile.username,
        email: profile.email,
        full_name: profile.full_name,
        email_verified: profile.email_verified,
        created_at: profile.created_at,
    }
}

/// Handle requests for creating a new account
pub async fn signup(
    State(state): State<ServerState>,
    Json(payload): Json<SignUp>,
) -> Result<(StatusCode, Json<ProfileView>), ServerError> {
    let profile = state
        .engine
        .create_user(NewUser {
            username: payload.username,
            password: payload.password,
            email: payload.email,
            full_name: payload.full_name,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(to_view(profile))))
}

pub async fn get(
    Extension(user): Extension<Profile>,
    State(state): State<ServerState>,
) -> Result<Json<ProfileView>, ServerError> {
    let profile = state.engine.profile(&user.username).await?;
    Ok(Json(to_view(profile)))
}

pub async fn update(
    Extension(user): Extension<Profile>,
    State(state): State<ServerState>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<ProfileView>, ServerError> {
    let profile = state
        .engine
        .update_profile(&user.username, &payload.full_name, &payload.email)
        .await?;
    Ok(Json(to_view(profile)))
}

pub async fn change_password(
    Extension(user): Extension<Profile>,
    State(state): State<ServerState>,
    Json(payload): Json<PasswordChange>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .change_password(
            &user.username,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Deletes the account with all its data
pub async fn remove(
    Extension(user): Extension<Profile>,
    State(state): State<ServerState>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_account(&user.username).await?;
    Ok(StatusCode::NO_CONTENT)
}
