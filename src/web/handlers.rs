use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ContactsError;
use crate::forms::{AddressFormSet, AddressRowInput, ContactForm, ContactInput, FormSetErrors};
use crate::model::{Contact, Id};
use crate::ops::contact_ops;
use crate::queries::contact_queries;
use crate::validation::FieldErrors;

use super::error::WebError;
use super::extract::{FragmentFormat, ResponseFormat, StructuredFormat, Submission};
use super::render::{self, ContactFormView};
use super::{AppState, FRAGMENT_PATH, LIST_PATH, NEW_PATH, STRUCTURED_PATH};

pub const SAVED_MESSAGE: &str = "Contact saved successfully!";
pub const CREATED_MESSAGE: &str = "Contact created successfully!";

/// Blank address rows offered below the existing ones.
const EXTRA_ROWS: usize = 1;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus { status: "healthy" })
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
}

pub async fn list_contacts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, WebError> {
    let conn = state.conn.lock();
    let page = contact_queries::list_page(&conn, query.page.as_deref(), state.page_size)?;
    debug!(page = page.number, total = page.total, "Listing contacts");
    Ok(Html(render::contact_list(&page)))
}

pub async fn new_contact() -> Html<String> {
    blank_form_page(NEW_PATH)
}

pub async fn create_contact(State(state): State<AppState>, submission: Submission) -> Result<Response, WebError> {
    create_flow(&state, &submission, ResponseFormat::Page, NEW_PATH)
}

pub async fn new_contact_fragment() -> Html<String> {
    blank_form_page(FRAGMENT_PATH)
}

pub async fn create_contact_fragment(
    State(state): State<AppState>,
    FragmentFormat(format): FragmentFormat,
    submission: Submission,
) -> Result<Response, WebError> {
    create_flow(&state, &submission, format, FRAGMENT_PATH)
}

pub async fn new_contact_structured() -> Html<String> {
    blank_form_page(STRUCTURED_PATH)
}

pub async fn create_contact_structured(
    State(state): State<AppState>,
    StructuredFormat(format): StructuredFormat,
    submission: Submission,
) -> Result<Response, WebError> {
    create_flow(&state, &submission, format, STRUCTURED_PATH)
}

pub async fn edit_contact(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Html<String>, WebError> {
    let id = parse_contact_id(&raw_id)?;
    let conn = state.conn.lock();
    let contact = contact_queries::get_contact(&conn, id)?.ok_or(WebError::NotFound)?;

    let input = ContactInput::from_contact(&contact);
    let errors = FieldErrors::new();
    let view = ContactFormView {
        input: &input,
        errors: &errors,
        avatar: contact.avatar.as_deref(),
    };
    Ok(Html(render::contact_form_page(
        &format!("Edit {}", contact),
        &edit_path(id),
        &view,
    )))
}

pub async fn update_contact(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    submission: Submission,
) -> Result<Response, WebError> {
    let id = parse_contact_id(&raw_id)?;
    let form = submission.contact_form().for_instance(id);

    let conn = state.conn.lock();
    match contact_ops::update_contact(&conn, &state.avatars, &form) {
        Ok(contact) => {
            info!(contact_id = %contact.id, "Contact updated via form");
            Ok(Redirect::to(LIST_PATH).into_response())
        }
        Err(ContactsError::Invalid(errors)) => {
            let contact = contact_queries::get_contact(&conn, id)?.ok_or(WebError::NotFound)?;
            let view = ContactFormView {
                input: &form.input,
                errors: &errors.contact,
                avatar: contact.avatar.as_deref(),
            };
            Ok(Html(render::contact_form_page(
                &format!("Edit {}", contact),
                &edit_path(id),
                &view,
            ))
            .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn edit_addresses(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Html<String>, WebError> {
    let id = parse_contact_id(&raw_id)?;
    let conn = state.conn.lock();
    let (contact, addresses) =
        contact_queries::contact_with_addresses(&conn, id)?.ok_or(WebError::NotFound)?;

    let input = ContactInput::from_contact(&contact);
    let formset = AddressFormSet::initial(&addresses, EXTRA_ROWS);
    Ok(Html(addresses_page(
        &contact,
        &input,
        &FieldErrors::new(),
        formset.rows(),
        &FormSetErrors::default(),
    )))
}

pub async fn update_addresses(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    submission: Submission,
) -> Result<Response, WebError> {
    let id = parse_contact_id(&raw_id)?;
    let form = submission.contact_form().for_instance(id);
    let formset = submission.address_formset();

    let mut conn = state.conn.lock();
    match contact_ops::save_contact_with_addresses(&mut conn, &state.avatars, &form, &formset) {
        Ok((contact, changes)) => {
            if changes.is_empty() {
                debug!(contact_id = %contact.id, "Contact saved, addresses unchanged");
            } else {
                info!(
                    contact_id = %contact.id,
                    inserted = changes.inserted.len(),
                    updated = changes.updated,
                    deleted = changes.deleted,
                    "Contact and addresses saved via form"
                );
            }
            Ok(Redirect::to(LIST_PATH).into_response())
        }
        Err(ContactsError::Invalid(errors)) => {
            let contact = contact_queries::get_contact(&conn, id)?.ok_or(WebError::NotFound)?;
            let rows = rows_for_redisplay(formset.rows());
            Ok(Html(addresses_page(
                &contact,
                &form.input,
                &errors.contact,
                &rows,
                &errors.addresses,
            ))
            .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// JSON envelope of the structured create route.
#[derive(Debug, Serialize)]
pub struct StructuredReply {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_html: Option<String>,
}

/// Shared create flow. The connection lock spans the uniqueness check and
/// the insert.
fn create_flow(
    state: &AppState,
    submission: &Submission,
    format: ResponseFormat,
    action: &str,
) -> Result<Response, WebError> {
    let form = submission.contact_form();
    let result = {
        let conn = state.conn.lock();
        contact_ops::create_contact(&conn, &state.avatars, &form)
    };

    match result {
        Ok(contact) => {
            debug!(contact_id = %contact.id, ?format, "Contact created via form");
            Ok(created_response(format))
        }
        Err(ContactsError::Invalid(errors)) => Ok(invalid_response(format, action, &form, &errors.contact)),
        Err(e) => Err(e.into()),
    }
}

fn created_response(format: ResponseFormat) -> Response {
    match format {
        ResponseFormat::Page => Redirect::to(LIST_PATH).into_response(),
        ResponseFormat::Fragment => Html(render::success_alert(SAVED_MESSAGE)).into_response(),
        ResponseFormat::Structured => Json(StructuredReply {
            ok: true,
            message: Some(CREATED_MESSAGE.to_string()),
            form_html: None,
        })
        .into_response(),
    }
}

fn invalid_response(
    format: ResponseFormat,
    action: &str,
    form: &ContactForm,
    errors: &FieldErrors,
) -> Response {
    let view = ContactFormView {
        input: &form.input,
        errors,
        avatar: None,
    };
    match format {
        ResponseFormat::Page => Html(new_form_page(action, &view)).into_response(),
        ResponseFormat::Fragment => {
            (StatusCode::BAD_REQUEST, Html(render::contact_form_htmx(action, &view))).into_response()
        }
        ResponseFormat::Structured => Json(StructuredReply {
            ok: false,
            message: None,
            form_html: Some(render::contact_form(action, &view)),
        })
        .into_response(),
    }
}

fn blank_form_page(action: &str) -> Html<String> {
    let input = ContactInput::default();
    let errors = FieldErrors::new();
    let view = ContactFormView {
        input: &input,
        errors: &errors,
        avatar: None,
    };
    Html(new_form_page(action, &view))
}

/// Only the fragment route's page is wired for htmx.
fn new_form_page(action: &str, view: &ContactFormView<'_>) -> String {
    if action == FRAGMENT_PATH {
        render::contact_form_htmx_page("New contact", action, view)
    } else {
        render::contact_form_page("New contact", action, view)
    }
}

fn addresses_page(
    contact: &Contact,
    input: &ContactInput,
    errors: &FieldErrors,
    rows: &[AddressRowInput],
    row_errors: &FormSetErrors,
) -> String {
    let view = ContactFormView {
        input,
        errors,
        avatar: contact.avatar.as_deref(),
    };
    render::contact_with_addresses_page(contact, &addresses_path(contact.id), &view, rows, row_errors)
}

/// Submitted rows, or a single blank row when none were sent, so the page
/// always offers somewhere to type.
fn rows_for_redisplay(rows: &[AddressRowInput]) -> Vec<AddressRowInput> {
    if rows.is_empty() {
        vec![AddressRowInput::default(); EXTRA_ROWS]
    } else {
        rows.to_vec()
    }
}

fn parse_contact_id(raw: &str) -> Result<Id<Contact>, WebError> {
    Id::parse(raw).map_err(|_| WebError::NotFound)
}

fn edit_path(id: Id<Contact>) -> String {
    format!("/contacts/{}/edit/", id)
}

fn addresses_path(id: Id<Contact>) -> String {
    format!("/contacts/{}/addresses/", id)
}
