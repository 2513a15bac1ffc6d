//! Request decoding: submissions and response formats.
//!
//! Headers are inspected here and nowhere else; handlers receive a
//! [`ResponseFormat`] and a [`Submission`].

use std::convert::Infallible;

use axum::extract::{FromRequest, FromRequestParts, Multipart, Query, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::Deserialize;
use tracing::debug;

use crate::forms::{
    AddressFormSet, AddressRowInput, ContactForm, ContactInput, FormFields, UploadedFile,
};

/// How a create flow answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    /// Full page; redirect on success.
    #[default]
    Page,
    /// Form partial on failure, alert on success.
    Fragment,
    /// JSON envelope.
    Structured,
}

impl ResponseFormat {
    pub fn from_query_value(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "page" | "html" => Some(Self::Page),
            "fragment" | "partial" => Some(Self::Fragment),
            "json" | "structured" => Some(Self::Structured),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FormatQuery {
    format: Option<String>,
}

fn format_override(parts: &Parts) -> Option<ResponseFormat> {
    let Query(query) = Query::<FormatQuery>::try_from_uri(&parts.uri).ok()?;
    query.format.as_deref().and_then(ResponseFormat::from_query_value)
}

fn header_is_truthy(headers: &HeaderMap, name: &str) -> bool {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| !v.trim().eq_ignore_ascii_case("false"))
}

/// `HX-Request` present: fragment responses.
#[derive(Debug, Clone, Copy)]
pub struct FragmentFormat(pub ResponseFormat);

impl<S> FromRequestParts<S> for FragmentFormat
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let format = format_override(parts).unwrap_or_else(|| {
            if header_is_truthy(&parts.headers, "hx-request") {
                ResponseFormat::Fragment
            } else {
                ResponseFormat::Page
            }
        });
        Ok(Self(format))
    }
}

/// `X-Requested-With: XMLHttpRequest`: JSON responses.
#[derive(Debug, Clone, Copy)]
pub struct StructuredFormat(pub ResponseFormat);

impl<S> FromRequestParts<S> for StructuredFormat
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let format = format_override(parts).unwrap_or_else(|| {
            let xhr = parts
                .headers
                .get("x-requested-with")
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));
            if xhr {
                ResponseFormat::Structured
            } else {
                ResponseFormat::Page
            }
        });
        Ok(Self(format))
    }
}

/// JSON body accepted by the form routes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JsonSubmission {
    pub contact: ContactInput,
    pub addresses: Vec<AddressRowInput>,
    pub clear_avatar: bool,
}

/// A decoded POST body.
#[derive(Debug, Clone)]
pub enum Submission {
    Form {
        fields: FormFields,
        files: Vec<UploadedFile>,
    },
    Json(JsonSubmission),
}

impl Submission {
    pub fn contact_form(&self) -> ContactForm {
        match self {
            Submission::Form { fields, files } => {
                let avatar = files.iter().find(|f| f.field == "avatar").cloned();
                ContactForm::bind(ContactInput::from_fields(fields))
                    .with_avatar(avatar)
                    .with_clear_avatar(fields.checked("avatar-clear"))
            }
            Submission::Json(payload) => {
                ContactForm::bind(payload.contact.clone()).with_clear_avatar(payload.clear_avatar)
            }
        }
    }

    pub fn address_formset(&self) -> AddressFormSet {
        match self {
            Submission::Form { fields, .. } => AddressFormSet::from_fields(fields),
            Submission::Json(payload) => AddressFormSet::new(payload.addresses.clone()),
        }
    }
}

impl<S> FromRequest<S> for Submission
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            return read_multipart(multipart).await;
        }

        if content_type.starts_with("application/json") {
            let Json(payload) = Json::<JsonSubmission>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            return Ok(Submission::Json(payload));
        }

        let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;
        Ok(Submission::Form {
            fields: FormFields::new(pairs),
            files: Vec::new(),
        })
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<Submission, Response> {
    let mut fields = FormFields::default();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(IntoResponse::into_response)?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        match file_name {
            Some(file_name) => {
                let data = field.bytes().await.map_err(IntoResponse::into_response)?;
                // Browsers send an empty part for an untouched file input.
                if file_name.is_empty() && data.is_empty() {
                    continue;
                }
                debug!(field = %name, size = data.len(), "Received upload");
                files.push(UploadedFile {
                    field: name,
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
            None => {
                let value = field.text().await.map_err(IntoResponse::into_response)?;
                fields.push(name, value);
            }
        }
    }

    Ok(Submission::Form { fields, files })
}
