//! Email verification and password resets through one-time codes

use api_types::{
    otp::{SendOtp, SendOtpResponse, VerifyOtp, VerifyOtpResponse},
    password::{ForgotPassword, ForgotPasswordResponse, ResetPassword, ResetPasswordResponse},
};
use axum::{Json, extract::State};

use crate::{
    ServerError,
    otp::{OtpOutcome, OtpPurpose},
    server::ServerState,
};

const RESET_REQUESTED: &str = "If an account exists for this email, a reset code has been sent";

/// Issues a code for the address and mails it.
pub async fn send_otp(
    State(state): State<ServerState>,
    Json(payload): Json<SendOtp>,
) -> Result<Json<SendOtpResponse>, ServerError> {
    let email = payload.email.trim();
    let full_name = payload.full_name.trim();
    if email.is_empty() || full_name.is_empty() {
        return Err(ServerError::Generic(
            "Email and full name are required".to_string(),
        ));
    }

    let code = state.otp.issue(OtpPurpose::EmailVerification, email);
    let mail = state
        .mailer
        .verification_mail(email, full_name, &code, state.otp.ttl());
    state.mailer.send(&mail).await?;
    tracing::info!(email, "verification code issued");

    Ok(Json(SendOtpResponse {
        success: true,
        message: "OTP sent successfully".to_string(),
        otp: state.expose_otp.then_some(code),
    }))
}

/// Checks a code. On success the matching account, if any, is flagged as
/// verified.
pub async fn verify_otp(
    State(state): State<ServerState>,
    Json(payload): Json<VerifyOtp>,
) -> Result<Json<VerifyOtpResponse>, ServerError> {
    let email = payload.email.trim();
    let code = payload.otp.trim();
    if email.is_empty() || code.is_empty() {
        return Err(ServerError::Generic(
            "Email and OTP are required".to_string(),
        ));
    }

    let outcome = state.otp.verify(OtpPurpose::EmailVerification, email, code);
    if outcome != OtpOutcome::Verified {
        tracing::warn!(email, ?outcome, "verification code rejected");
        return Err(ServerError::Generic(outcome.message().to_string()));
    }

    if !state.engine.mark_email_verified(email).await? {
        tracing::debug!(email, "verified address has no account yet");
    }

    Ok(Json(VerifyOtpResponse {
        success: true,
        message: outcome.message().to_string(),
    }))
}

/// Mails a reset code when the address belongs to an account. The answer does
/// not tell whether it does.
pub async fn forgot_password(
    State(state): State<ServerState>,
    Json(payload): Json<ForgotPassword>,
) -> Result<Json<ForgotPasswordResponse>, ServerError> {
    let email = payload.email.trim();
    if email.is_empty() {
        return Err(ServerError::Generic("Email is required".to_string()));
    }

    let mut issued = None;
    if state.engine.email_registered(email).await? {
        let code = state.otp.issue(OtpPurpose::PasswordReset, email);
        let mail = state
            .mailer
            .password_reset_mail(email, &code, state.otp.ttl());
        state.mailer.send(&mail).await?;
        tracing::info!(email, "password reset code issued");
        issued = Some(code);
    } else {
        tracing::debug!(email, "password reset asked for an unknown address");
    }

    Ok(Json(ForgotPasswordResponse {
        success: true,
        message: RESET_REQUESTED.to_string(),
        otp: issued.filter(|_| state.expose_otp),
    }))
}

/// Sets a new password once the reset code checks out.
pub async fn reset_password(
    State(state): State<ServerState>,
    Json(payload): Json<ResetPassword>,
) -> Result<Json<ResetPasswordResponse>, ServerError> {
    let email = payload.email.trim();
    let code = payload.otp.trim();
    if email.is_empty() || code.is_empty() || payload.new_password.is_empty() {
        return Err(ServerError::Generic(
            "Email, OTP and new password are required".to_string(),
        ));
    }

    let outcome = state.otp.verify(OtpPurpose::PasswordReset, email, code);
    if outcome != OtpOutcome::Verified {
        tracing::warn!(email, ?outcome, "password reset code rejected");
        return Err(ServerError::Generic(outcome.message().to_string()));
    }

    state
        .engine
        .reset_password(email, &payload.new_password)
        .await?;

    Ok(Json(ResetPasswordResponse {
        success: true,
        message: "Password updated successfully".to_string(),
    }))
}
