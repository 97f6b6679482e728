use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};

use std::sync::Arc;

use crate::{
    expenses, groups, health, mail::Mailer, otp::OtpStore, profile, settlement, verification,
};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub otp: Arc<OtpStore>,
    pub mailer: Arc<Mailer>,
    /// Echo verification codes in the API response (development only).
    pub expose_otp: bool,
}

impl ServerState {
    pub fn new(engine: Engine, otp: OtpStore, mailer: Mailer) -> Self {
        Self {
            engine: Arc::new(engine),
            otp: Arc::new(otp),
            mailer: Arc::new(mailer),
            expose_otp: false,
        }
    }

    pub fn expose_otp(mut self, expose: bool) -> Self {
        self.expose_otp = expose;
        self
    }
}

/// Resolves HTTP Basic credentials to a [`engine::Profile`] stored in the
/// request extensions.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(auth_header)) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let profile = state
        .engine
        .authenticate(auth_header.username(), auth_header.password())
        .await
        .map_err(|err| {
            tracing::debug!(username = auth_header.username(), "authentication failed: {err}");
            StatusCode::UNAUTHORIZED
        })?;

    request.extensions_mut().insert(profile);
    Ok(next.run(request).await)
}

/// Full API: public routes plus the Basic-auth protected ones.
pub fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route(
            "/api/profile",
            get(profile::get)
                .put(profile::update)
                .delete(profile::remove),
        )
        .route("/api/profile/password", post(profile::change_password))
        .route(
            "/api/personal-expenses",
            get(expenses::list).post(expenses::create),
        )
        .route(
            "/api/personal-expenses/analytics",
            get(expenses::analytics),
        )
        .route(
            "/api/personal-expenses/monthly/{year}/{month}",
            get(expenses::monthly),
        )
        .route(
            "/api/personal-expenses/{id}",
            put(expenses::update).delete(expenses::remove),
        )
        .route("/api/groups", get(groups::list).post(groups::create))
        .route("/api/groups/{id}", delete(groups::remove))
        .route("/api/groups/{id}/settlement", get(settlement::group))
        .route("/api/group-members", post(groups::set_members))
        .route("/api/group-members/{group_id}", get(groups::members))
        .route("/api/group-expenses", post(groups::expense_new))
        .route("/api/group-expenses/{group_id}", get(groups::expenses))
        .route(
            "/api/group-expenses/{group_id}/{expense_id}",
            delete(groups::expense_remove),
        )
        .route("/api/settle", post(settlement::adhoc))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    Router::new()
        .route("/health", get(health::get))
        .route("/api/signup", post(profile::signup))
        .route("/api/send-otp", post(verification::send_otp))
        .route("/api/verify-otp", post(verification::verify_otp))
        .route("/api/forgot-password", post(verification::forgot_password))
        .route("/api/reset-password", post(verification::reset_password))
        .merge(protected)
        .with_state(state)
}

pub async fn run(state: ServerState, addr: &str) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(state, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(state, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
