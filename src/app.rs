use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{IdentityProvider, JwtIdentityProvider};
use crate::config::{AppConfig, SecurityConfig};
use crate::database::DocumentStore;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;

/// Everything a handler needs, injected once at router construction.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>) -> Self {
        let identity = Arc::new(JwtIdentityProvider::new(config.security.jwt_secret.clone()));
        Self {
            config: Arc::new(config),
            store,
            identity,
        }
    }
}

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);

    Router::new()
        // Public
        .route("/", get(public::system::root))
        .route("/health", get(public::system::health))
        .merge(public_routes())
        // Protected
        .merge(protected_routes(state.clone()))
        .with_state(state)
        // Global middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn public_routes() -> Router<AppState> {
    use public::posts;

    Router::new()
        .route("/posts", get(posts::post_list))
        .route("/posts/:id", get(posts::post_get))
}

// The JWT layer goes on each method router rather than the whole Router, so
// an unrouted method on a shared path still falls through to 405.
fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{comments, likes, posts};

    let auth = middleware::from_fn_with_state(state, jwt_auth_middleware);

    Router::new()
        .route("/posts", post(posts::post_create).route_layer(auth.clone()))
        .route(
            "/posts/:id",
            put(posts::post_update).delete(posts::post_delete).route_layer(auth.clone()),
        )
        .route(
            "/comments",
            get(comments::comment_list).post(comments::comment_create).route_layer(auth.clone()),
        )
        .route(
            "/comments/:id",
            get(comments::comment_get)
                .put(comments::comment_update)
                .delete(comments::comment_delete)
                .route_layer(auth.clone()),
        )
        .route("/likes", get(likes::like_list).post(likes::like_create).route_layer(auth.clone()))
        .route("/likes/:id", get(likes::like_get).delete(likes::like_delete).route_layer(auth))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
