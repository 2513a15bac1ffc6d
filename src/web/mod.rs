//! HTTP surface: routes, shared state and response rendering.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod render;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::response::Redirect;
use axum::routing::get;
use axum::Router;
use parking_lot::Mutex;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;

use crate::storage::AvatarStore;

pub use error::WebError;
pub use extract::{ResponseFormat, Submission};

pub const LIST_PATH: &str = "/contacts/";
pub const NEW_PATH: &str = "/contacts/new/";
pub const FRAGMENT_PATH: &str = "/contacts/new-ajax/";
pub const STRUCTURED_PATH: &str = "/contacts/new/ajax/";

/// Contacts listed per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Request body cap. Larger than the avatar limit so oversized uploads are
/// reported as a field error rather than rejected outright.
pub const DEFAULT_BODY_LIMIT: usize = 8 * 1024 * 1024;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub conn: Arc<Mutex<Connection>>,
    pub avatars: Arc<AvatarStore>,
    pub page_size: usize,
}

impl AppState {
    pub fn new(conn: Connection, avatars: AvatarStore) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            avatars: Arc::new(avatars),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

pub fn router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to(LIST_PATH) }))
        .route("/health", get(handlers::health))
        .route(LIST_PATH, get(handlers::list_contacts))
        .route(NEW_PATH, get(handlers::new_contact).post(handlers::create_contact))
        .route(
            "/contacts/{id}/edit/",
            get(handlers::edit_contact).post(handlers::update_contact),
        )
        .route(
            "/contacts/{id}/addresses/",
            get(handlers::edit_addresses).post(handlers::update_addresses),
        )
        .route(
            FRAGMENT_PATH,
            get(handlers::new_contact_fragment).post(handlers::create_contact_fragment),
        )
        .route(
            STRUCTURED_PATH,
            get(handlers::new_contact_structured).post(handlers::create_contact_structured),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
