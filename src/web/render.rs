//! Server-side HTML for the contact pages.
//!
//! Markup is assembled with `format!`; every interpolated value goes through
//! [`escape`].

use crate::forms::address_formset::PREFIX;
use crate::forms::{AddressRowInput, ContactInput, FormSetErrors};
use crate::model::Contact;
use crate::queries::Page;
use crate::validation::FieldErrors;

use super::{LIST_PATH, NEW_PATH};

/// Everything needed to draw the contact fields.
pub struct ContactFormView<'a> {
    pub input: &'a ContactInput,
    pub errors: &'a FieldErrors,
    /// Stored avatar reference, shown on edit forms.
    pub avatar: Option<&'a str>,
}

pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

pub fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <title>{title}</title>
  <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css">
  <script src="https://unpkg.com/htmx.org@1.9.12"></script>
</head>
<body class="container py-4">
<h1 class="h3 mb-4">{title}</h1>
{body}
</body>
</html>"#,
        title = escape(title),
        body = body,
    )
}

fn error_list(messages: &[String]) -> String {
    messages
        .iter()
        .map(|m| format!(r#"<div class="text-danger small">{}</div>"#, escape(m)))
        .collect()
}

fn text_input(name: &str, label: &str, kind: &str, value: &str, placeholder: &str, errors: &[String]) -> String {
    let invalid = if errors.is_empty() { "" } else { " is-invalid" };
    format!(
        r#"<div class="mb-3">
  <label class="form-label" for="id_{name}">{label}</label>
  <input type="{kind}" name="{name}" id="id_{name}" value="{value}" placeholder="{placeholder}" class="form-control{invalid}">
  {errors}
</div>
"#,
        name = name,
        label = escape(label),
        kind = kind,
        value = escape(value),
        placeholder = escape(placeholder),
        invalid = invalid,
        errors = error_list(errors),
    )
}

/// The contact fields without the surrounding `<form>`.
pub fn contact_fields(view: &ContactFormView<'_>) -> String {
    let input = view.input;
    let errors = view.errors;
    let mut html = String::new();

    html.push_str(&text_input("first_name", "First name", "text", &input.first_name, "Ada", errors.get("first_name")));
    html.push_str(&text_input("last_name", "Last name", "text", &input.last_name, "Lovelace", errors.get("last_name")));
    html.push_str(&text_input("email", "Email", "email", &input.email, "ada@example.com", errors.get("email")));

    let current = match view.avatar {
        Some(reference) => format!(
            r#"<div class="small mb-1">Currently: {reference}
    <label><input type="checkbox" name="avatar-clear"> Clear</label></div>"#,
            reference = escape(reference)
        ),
        None => String::new(),
    };
    html.push_str(&format!(
        r#"<div class="mb-3">
  <label class="form-label" for="id_avatar">Avatar</label>
  {current}
  <input type="file" name="avatar" id="id_avatar" accept="image/*" class="form-control">
  {errors}
</div>
"#,
        current = current,
        errors = error_list(errors.get("avatar")),
    ));

    html.push_str(&format!(
        r#"<div class="mb-3">
  <label class="form-label" for="id_notes">Notes</label>
  <textarea name="notes" id="id_notes" rows="3" placeholder="Additional information..." class="form-control">{notes}</textarea>
  {errors}
</div>
"#,
        notes = escape(&input.notes),
        errors = error_list(errors.get("notes")),
    ));

    html
}

/// A standalone contact `<form>` submitted by the browser as a normal
/// navigation.
pub fn contact_form(action: &str, view: &ContactFormView<'_>) -> String {
    render_contact_form(action, "", view)
}

/// The contact `<form>` for the fragment route. htmx posts it and swaps the
/// response in place of the form. Also the partial returned to htmx requests.
pub fn contact_form_htmx(action: &str, view: &ContactFormView<'_>) -> String {
    let hx = format!(
        r#" hx-post="{}" hx-encoding="multipart/form-data" hx-swap="outerHTML""#,
        escape(action)
    );
    render_contact_form(action, &hx, view)
}

fn render_contact_form(action: &str, hx: &str, view: &ContactFormView<'_>) -> String {
    format!(
        r#"<form id="contact-form" method="post" action="{action}"{hx} enctype="multipart/form-data">
{fields}<button type="submit" class="btn btn-primary">Save</button>
</form>"#,
        action = escape(action),
        hx = hx,
        fields = contact_fields(view),
    )
}

pub fn contact_form_page(title: &str, action: &str, view: &ContactFormView<'_>) -> String {
    form_page(title, &contact_form(action, view))
}

pub fn contact_form_htmx_page(title: &str, action: &str, view: &ContactFormView<'_>) -> String {
    form_page(title, &contact_form_htmx(action, view))
}

fn form_page(title: &str, form: &str) -> String {
    let body = format!(
        r#"{form}
<p class="mt-3"><a href="{list}">Back to contacts</a></p>"#,
        form = form,
        list = LIST_PATH,
    );
    layout(title, &body)
}

fn address_row(index: usize, row: &AddressRowInput, errors: Option<&FieldErrors>) -> String {
    let empty = FieldErrors::new();
    let errors = errors.unwrap_or(&empty);
    let name = |field: &str| format!("{}-{}-{}", PREFIX, index, field);

    let id = row.id.as_deref().unwrap_or_default();
    let hidden_id = format!(
        r#"<input type="hidden" name="{}" value="{}">{}"#,
        name("id"),
        escape(id),
        error_list(errors.get("id")),
    );

    let cell = |lead: &str, field: &str, value: &str| {
        let invalid = if errors.contains(field) { " is-invalid" } else { "" };
        format!(
            r#"<td>{lead}<input type="text" name="{name}" value="{value}" class="form-control form-control-sm{invalid}">{errors}</td>"#,
            lead = lead,
            name = name(field),
            value = escape(value),
            invalid = invalid,
            errors = error_list(errors.get(field)),
        )
    };

    let checked = if row.delete { " checked" } else { "" };
    format!(
        r#"<tr>
  {label}{line1}{line2}{city}{country}
  <td><input type="checkbox" name="{delete_name}"{checked}></td>
</tr>
"#,
        label = cell(hidden_id.as_str(), "label", &row.label),
        line1 = cell("", "line1", &row.line1),
        line2 = cell("", "line2", &row.line2),
        city = cell("", "city", &row.city),
        country = cell("", "country", &row.country),
        delete_name = name("DELETE"),
        checked = checked,
    )
}

/// Address rows plus the management fields that declare how many rows the
/// browser will send back.
pub fn address_formset(rows: &[AddressRowInput], errors: &FormSetErrors) -> String {
    let initial = rows
        .iter()
        .filter(|r| r.id.as_deref().is_some_and(|id| !id.trim().is_empty()))
        .count();

    let body: String = rows
        .iter()
        .enumerate()
        .map(|(i, row)| address_row(i, row, errors.row(i)))
        .collect();

    format!(
        r#"<fieldset class="mb-3">
<legend class="h5">Addresses</legend>
<input type="hidden" name="{prefix}-TOTAL_FORMS" value="{total}">
<input type="hidden" name="{prefix}-INITIAL_FORMS" value="{initial}">
{non_row}
<table class="table table-sm">
<thead><tr><th>Label</th><th>Line 1</th><th>Line 2</th><th>City</th><th>Country</th><th>Delete</th></tr></thead>
<tbody>
{body}</tbody>
</table>
</fieldset>
"#,
        prefix = PREFIX,
        total = rows.len(),
        initial = initial,
        non_row = error_list(&errors.non_row),
        body = body,
    )
}

pub fn contact_with_addresses_page(
    contact: &Contact,
    action: &str,
    view: &ContactFormView<'_>,
    rows: &[AddressRowInput],
    row_errors: &FormSetErrors,
) -> String {
    let body = format!(
        r#"<form method="post" action="{action}" enctype="multipart/form-data">
{fields}{formset}<button type="submit" class="btn btn-primary">Save</button>
</form>
<p class="mt-3"><a href="{list}">Back to contacts</a></p>"#,
        action = escape(action),
        fields = contact_fields(view),
        formset = address_formset(rows, row_errors),
        list = LIST_PATH,
    );
    layout(&format!("Edit {}", contact), &body)
}

pub fn contact_list(page: &Page<Contact>) -> String {
    let mut body = format!(
        r#"<p><a class="btn btn-primary" href="{new}">New contact</a></p>
"#,
        new = NEW_PATH
    );

    if page.items.is_empty() {
        body.push_str(r#"<p class="text-muted">No contacts yet.</p>"#);
        return layout("Contacts", &body);
    }

    body.push_str(
        r#"<table class="table">
<thead><tr><th>Name</th><th>Email</th><th>Added</th><th></th></tr></thead>
<tbody>
"#,
    );
    for contact in &page.items {
        body.push_str(&format!(
            r#"<tr><td><a href="/contacts/{id}/edit/">{name}</a></td><td>{email}</td><td>{added}</td><td><a href="/contacts/{id}/addresses/">Addresses</a></td></tr>
"#,
            id = contact.id,
            name = escape(&contact.to_string()),
            email = escape(&contact.email),
            added = contact.created_at.format("%Y-%m-%d"),
        ));
    }
    body.push_str("</tbody>\n</table>\n");

    body.push_str(r#"<nav class="pagination">"#);
    if page.has_previous() {
        body.push_str(&format!(r#"<a href="?page={}">previous</a> "#, page.number - 1));
    }
    body.push_str(&format!(
        r#"<span class="current">Page {} of {}.</span>"#,
        page.number, page.num_pages
    ));
    if page.has_next() {
        body.push_str(&format!(r#" <a href="?page={}">next</a>"#, page.number + 1));
    }
    body.push_str("</nav>");

    layout("Contacts", &body)
}

pub fn success_alert(message: &str) -> String {
    format!("<div class='alert alert-success'>{}</div>", escape(message))
}

pub fn not_found_page() -> String {
    layout("Not found", r#"<p>The requested page does not exist.</p>"#)
}

pub fn error_page(message: &str) -> String {
    layout("Error", &format!("<p>{}</p>", escape(message)))
}
