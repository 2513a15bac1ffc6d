pub mod fields;
pub mod contact_form;
pub mod address_formset;

use serde::Serialize;
use std::fmt;

use crate::validation::FieldErrors;

pub use address_formset::{AddressFormSet, AddressRowInput, FormSetErrors, RowCommand};
pub use contact_form::{AvatarChange, ContactDraft, ContactForm, ContactInput};
pub use fields::{FormFields, UploadedFile};

/// Every error of one submission: the contact form and, when present, its
/// address rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors {
    pub contact: FieldErrors,
    pub addresses: FormSetErrors,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.contact.is_empty() && self.addresses.is_empty()
    }
}

impl From<FieldErrors> for FormErrors {
    fn from(contact: FieldErrors) -> Self {
        Self {
            contact,
            addresses: FormSetErrors::default(),
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.contact)?;
        for message in &self.addresses.non_row {
            write!(f, "; addresses: {}", message)?;
        }
        for (index, errors) in &self.addresses.rows {
            write!(f, "; addresses[{}]: {}", index, errors)?;
        }
        Ok(())
    }
}
