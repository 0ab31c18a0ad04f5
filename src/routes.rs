use std::sync::Arc;

use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, Request, header},
    middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    controllers::{Surface, auth, books, catalog, home, me, reading, reminders, users},
    middlewares::{
        api_user_middleware, app_key_middleware, jwt_auth_middleware,
        optional_api_user_middleware, optional_jwt_auth_middleware,
    },
    state::{AppState, SharedAppState},
};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Routes readable without an account; a known viewer still sees their own
/// private books.
fn browse_routes() -> Router<SharedAppState> {
    Router::new()
        .route("/categories", get(catalog::categories))
        .route("/categories/{id}/books", get(catalog::category_books))
        .route("/authors", get(catalog::authors))
        .route("/languages", get(catalog::languages))
        .route("/books/search", get(catalog::search))
        .route("/books/{id}", get(books::show))
}

fn reader_routes() -> Router<SharedAppState> {
    Router::new()
        .route("/me", get(me::index))
        .route("/me/password", put(me::change_password))
        .route("/me/subscription", put(me::update_subscription))
        .route("/users/{id}", get(users::show))
        .route("/home", get(home::show))
        .route("/home/recommendations", get(home::recommendations))
        .route("/books", post(books::store))
        .route("/books/uploaded", get(books::uploaded))
        .route(
            "/books/{id}/home",
            post(reading::add).delete(reading::remove),
        )
        .route("/books/{id}/open", post(reading::open))
        .route("/books/{id}/page", put(reading::set_page))
        .route("/books/{id}/rating", put(reading::rate))
        .route("/books/{id}/comments", post(reading::comment))
        .route("/reminders", get(reminders::show).put(reminders::update))
}

pub fn init_router(app_state: AppState) -> Router {
    let state = Arc::new(app_state);

    let web = Router::new()
        .route("/", get(home::index))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/exists", get(auth::exists))
        .merge(browse_routes().route_layer(middleware::from_fn_with_state(
            state.clone(),
            optional_jwt_auth_middleware,
        )))
        .merge(reader_routes().route_layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        )))
        .layer(Extension(Surface::Web));

    let api = Router::new()
        .route("/auth", post(auth::api_login))
        .route("/auth/register", post(auth::register))
        .route("/auth/exists", get(auth::exists))
        .merge(browse_routes().route_layer(middleware::from_fn_with_state(
            state.clone(),
            optional_api_user_middleware,
        )))
        .merge(reader_routes().route_layer(middleware::from_fn_with_state(
            state.clone(),
            api_user_middleware,
        )))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            app_key_middleware,
        ))
        .layer(Extension(Surface::Mobile));

    let x_request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);
    let request_id_middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(
            x_request_id_header.clone(),
            MakeRequestUuid,
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|val| val.to_str().ok())
                    .unwrap_or_default();
                let user_agent = request
                    .headers()
                    .get(header::USER_AGENT)
                    .and_then(|val| val.to_str().ok())
                    .unwrap_or_default();

                let matched_path = request
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str);

                tracing::info_span!(
                    "http_request",
                    request_id,
                    method = ?request.method(),
                    uri = ?request.uri(),
                    path = matched_path,
                    version = ?request.version(),
                    user_agent,
                )
            }),
        )
        .layer(PropagateRequestIdLayer::new(x_request_id_header));

    web.nest("/api/v1", api)
        .layer(CompressionLayer::new())
        .layer(request_id_middleware)
        .with_state(state)
}
