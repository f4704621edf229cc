/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskapp_api::{app::{build_router, AppState}, config::Config};
/// use taskapp_shared::{notify::FakeMailer, store::InMemoryUserStore};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(
///     Arc::new(InMemoryUserStore::new()),
///     Arc::new(FakeMailer::new()),
///     config,
/// );
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, build_router(state)).await?;
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use taskapp_shared::{
    accounts::AccountService,
    auth::{middleware::session_auth, session::SessionManager},
    avatar::MAX_AVATAR_BYTES,
    notify::{Mailer, Notifier},
    store::UserStore,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Room for multipart framing around the largest accepted avatar
const UPLOAD_BODY_LIMIT: usize = MAX_AVATAR_BYTES + 64 * 1024;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; every
/// field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub sessions: SessionManager,
    pub accounts: AccountService,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the session manager, notifier and account service over `store`
    pub fn new(store: Arc<dyn UserStore>, mailer: Arc<dyn Mailer>, config: Config) -> Self {
        let sessions = SessionManager::new(store.clone(), config.jwt.secret.as_str());
        let notifier = Notifier::new(mailer, config.mail.from_address.clone());
        let accounts = AccountService::new(store.clone(), sessions.clone(), notifier);

        Self {
            store,
            sessions,
            accounts,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET    /health
/// ├── POST   /users                 # register (public)
/// ├── POST   /users/login           # public
/// ├── GET    /users/:id/avatar      # public
/// ├── GET    /users/me/avatar       # public, always 404
/// └── (session required)
///     ├── POST   /users/logout
///     ├── POST   /users/logoutAll
///     ├── GET    /users/me
///     ├── PATCH  /users/me
///     ├── DELETE /users/me
///     ├── POST   /users/me/avatar
///     └── DELETE /users/me/avatar
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/users", post(routes::users::register))
        .route("/users/login", post(routes::users::login))
        .route("/users/:id/avatar", get(routes::avatar::get_avatar));

    let session_routes = Router::new()
        .route("/users/logout", post(routes::users::logout))
        .route("/users/logoutAll", post(routes::users::logout_all))
        .route(
            "/users/me",
            get(routes::users::me)
                .patch(routes::users::update_me)
                .delete(routes::users::delete_me),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.sessions.clone(),
            session_auth,
        ));

    // GET stays public like `/users/:id/avatar`; upload and delete need a session
    let own_avatar = get(routes::avatar::get_own_avatar).merge(
        post(routes::avatar::upload_avatar)
            .delete(routes::avatar::delete_avatar)
            .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
            .route_layer(axum::middleware::from_fn_with_state(
                state.sessions.clone(),
                session_auth,
            )),
    );

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .route("/users/me/avatar", own_avatar)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
