use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_EMAIL: &str = "Enter a valid email address.";
pub const NAMES_MUST_DIFFER: &str = "Last name must be different from first name.";
pub const AVATAR_TOO_LARGE: &str = "Avatar must be under 2MB.";
pub const AVATAR_NOT_IMAGE: &str = "Please upload a valid image file.";
pub const EMPTY_FILE: &str = "The submitted file is empty.";

/// Largest accepted avatar upload, inclusive.
pub const MAX_AVATAR_BYTES: usize = 2 * 1024 * 1024;

/// Human-readable messages keyed by field name. Field order is stable so
/// rendered error lists do not shuffle between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Records the error of `result` against `field`, passing a success through.
    pub fn check<T>(&mut self, field: &str, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.add(field, message);
                None
            }
        }
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in self.iter() {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Trims a required text value and enforces its length cap.
/// Returns the trimmed string on success.
pub fn required(value: &str, max_chars: usize) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(REQUIRED.to_string());
    }
    max_length(trimmed, max_chars)?;
    Ok(trimmed.to_string())
}

/// Trims an optional text value. Blank input becomes an empty string.
pub fn optional(value: &str, max_chars: Option<usize>) -> Result<String, String> {
    let trimmed = value.trim();
    if let Some(max) = max_chars {
        max_length(trimmed, max)?;
    }
    Ok(trimmed.to_string())
}

/// Length caps count characters, not bytes.
pub fn max_length(value: &str, max_chars: usize) -> Result<(), String> {
    let count = value.chars().count();
    if count > max_chars {
        Err(format!(
            "Ensure this value has at most {} characters (it has {}).",
            max_chars, count
        ))
    } else {
        Ok(())
    }
}

/// Syntactic email check: `local@domain.tld` with a dot-atom local part and
/// a hostname of at least two labels. The top-level label is alphabetic
/// (or an `xn--` IDNA label) and at least two characters long.
pub fn email(value: &str) -> Result<(), String> {
    let invalid = || Err(INVALID_EMAIL.to_string());

    let Some((local, domain)) = value.rsplit_once('@') else {
        return invalid();
    };

    if local.is_empty() || local.starts_with('.') || local.ends_with('.') {
        return invalid();
    }
    if local.contains("..") || !local.chars().all(is_atom_char) {
        return invalid();
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return invalid();
    }
    for label in &labels {
        if label.is_empty() || label.len() > 63 {
            return invalid();
        }
        if label.starts_with('-') || label.ends_with('-') {
            return invalid();
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return invalid();
        }
    }
    if !labels.last().is_some_and(|tld| is_top_level_label(tld)) {
        return invalid();
    }
    Ok(())
}

fn is_top_level_label(label: &str) -> bool {
    label.len() >= 2
        && (label.starts_with("xn--") || label.chars().all(|c| c.is_ascii_alphabetic() || c == '-'))
}

fn is_atom_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || "!#$%&'*+/=?^_`{|}~-".contains(c)
}

/// First and last name must differ once trimmed. Blank names are left to the
/// required-field check.
pub fn names_differ(first_name: &str, last_name: &str) -> Result<(), String> {
    let first = first_name.trim();
    let last = last_name.trim();
    if !first.is_empty() && !last.is_empty() && first == last {
        Err(NAMES_MUST_DIFFER.to_string())
    } else {
        Ok(())
    }
}

/// Size is checked before type, so an oversized non-image reports the size.
pub fn avatar(size: usize, content_type: &str) -> Result<(), String> {
    if size == 0 {
        return Err(EMPTY_FILE.to_string());
    }
    if size > MAX_AVATAR_BYTES {
        return Err(AVATAR_TOO_LARGE.to_string());
    }
    if !content_type.trim().to_ascii_lowercase().starts_with("image/") {
        return Err(AVATAR_NOT_IMAGE.to_string());
    }
    Ok(())
}
