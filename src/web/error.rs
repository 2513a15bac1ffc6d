use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use tracing::error;

use crate::error::ContactsError;

use super::render;

/// Failures that end a request without a form to re-render.
#[derive(Debug)]
pub enum WebError {
    NotFound,
    BadRequest(String),
    Internal(ContactsError),
}

impl From<ContactsError> for WebError {
    fn from(err: ContactsError) -> Self {
        match err {
            ContactsError::NotFound { .. } => WebError::NotFound,
            ContactsError::Invalid(errors) => WebError::BadRequest(errors.to_string()),
            other => WebError::Internal(other),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            WebError::NotFound => (StatusCode::NOT_FOUND, Html(render::not_found_page())).into_response(),
            WebError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Html(render::error_page(&message))).into_response()
            }
            WebError::Internal(err) => {
                error!(error = %err, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(render::error_page("Something went wrong. Please try again later.")),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let resp = WebError::from(ContactsError::not_found("Contact", "x")).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn store_errors_map_to_500() {
        let err = ContactsError::Other("disk on fire".into());
        let resp = WebError::from(err).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
