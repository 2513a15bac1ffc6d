use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::queries::contact_queries;
use crate::error::{ContactsError, ContactsResult};
use crate::model::contact::{EMAIL_MAX, FIRST_NAME_MAX, LAST_NAME_MAX};
use crate::model::{Contact, Id};
use crate::validation::{self, FieldErrors};

use super::fields::{FormFields, UploadedFile};
use super::FormErrors;

pub const EMAIL_TAKEN: &str = "Contact with this Email already exists.";
pub const UPLOAD_AND_CLEAR: &str =
    "Please either submit a file or check the clear checkbox, not both.";

/// Raw contact fields exactly as the client sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub notes: String,
}

impl ContactInput {
    pub fn from_fields(fields: &FormFields) -> Self {
        Self {
            first_name: fields.text("first_name"),
            last_name: fields.text("last_name"),
            email: fields.text("email"),
            notes: fields.text("notes"),
        }
    }

    /// Pre-fills an edit form.
    pub fn from_contact(contact: &Contact) -> Self {
        Self {
            first_name: contact.first_name.clone(),
            last_name: contact.last_name.clone(),
            email: contact.email.clone(),
            notes: contact.notes.clone(),
        }
    }
}

/// What to do with the stored avatar when a draft is saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AvatarChange {
    #[default]
    Keep,
    Clear,
    Replace(UploadedFile),
}

/// A contact submission that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub notes: String,
    pub avatar: AvatarChange,
}

impl ContactDraft {
    pub fn into_contact(self) -> (Contact, AvatarChange) {
        let mut contact = Contact::create(self.first_name, self.last_name, self.email);
        contact.notes = self.notes;
        (contact, self.avatar)
    }

    /// Copies the text fields onto `contact`; the avatar is left to the caller.
    pub fn apply_to(self, contact: &mut Contact) -> AvatarChange {
        contact.first_name = self.first_name;
        contact.last_name = self.last_name;
        contact.email = self.email;
        contact.notes = self.notes;
        self.avatar
    }
}

/// Contact form bound to one submission.
#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    pub input: ContactInput,
    avatar: Option<UploadedFile>,
    clear_avatar: bool,
    instance: Option<Id<Contact>>,
}

impl ContactForm {
    pub fn bind(input: ContactInput) -> Self {
        Self {
            input,
            ..Self::default()
        }
    }

    pub fn with_avatar(mut self, avatar: Option<UploadedFile>) -> Self {
        self.avatar = avatar;
        self
    }

    pub fn with_clear_avatar(mut self, clear: bool) -> Self {
        self.clear_avatar = clear;
        self
    }

    /// Binds the form to an existing contact, which excludes it from the
    /// email uniqueness check.
    pub fn for_instance(mut self, id: Id<Contact>) -> Self {
        self.instance = Some(id);
        self
    }

    pub fn instance(&self) -> Option<Id<Contact>> {
        self.instance
    }

    /// Field, cross-field and upload rules. Does not touch the store.
    pub fn clean(&self) -> Result<ContactDraft, FieldErrors> {
        let mut errors = FieldErrors::new();
        let input = &self.input;

        let first_name = errors.check(
            "first_name",
            validation::required(&input.first_name, FIRST_NAME_MAX),
        );
        let last_name = errors.check(
            "last_name",
            validation::required(&input.last_name, LAST_NAME_MAX),
        );
        let email = errors.check(
            "email",
            validation::required(&input.email, EMAIL_MAX)
                .and_then(|e| validation::email(&e).map(|_| e)),
        );
        let notes = errors.check("notes", validation::optional(&input.notes, None));
        let avatar = errors.check("avatar", self.clean_avatar());

        if let (Some(first), Some(last)) = (&first_name, &last_name) {
            errors.check("last_name", validation::names_differ(first, last));
        }

        match (first_name, last_name, email, notes, avatar) {
            (Some(first_name), Some(last_name), Some(email), Some(notes), Some(avatar))
                if errors.is_empty() =>
            {
                Ok(ContactDraft {
                    first_name,
                    last_name,
                    email,
                    notes,
                    avatar,
                })
            }
            _ => Err(errors),
        }
    }

    fn clean_avatar(&self) -> Result<AvatarChange, String> {
        match (&self.avatar, self.clear_avatar) {
            (Some(_), true) if self.instance.is_some() => Err(UPLOAD_AND_CLEAR.to_string()),
            (Some(file), _) => {
                validation::avatar(file.size(), &file.content_type)?;
                Ok(AvatarChange::Replace(file.clone()))
            }
            (None, true) if self.instance.is_some() => Ok(AvatarChange::Clear),
            (None, _) => Ok(AvatarChange::Keep),
        }
    }

    /// Full validation: `clean` plus the email uniqueness lookup. A rejected
    /// submission comes back as `ContactsError::Invalid`.
    pub fn validate(&self, conn: &Connection) -> ContactsResult<ContactDraft> {
        let cleaned = self.clean();

        let mut errors = match &cleaned {
            Ok(_) => FieldErrors::new(),
            Err(e) => e.clone(),
        };

        // Only a syntactically valid address is worth looking up.
        if !errors.contains("email") {
            let email = self.input.email.trim();
            if let Some(owner) = contact_queries::find_by_email(conn, email)? {
                if Some(owner.id) != self.instance {
                    errors.add("email", EMAIL_TAKEN);
                }
            }
        }

        match cleaned {
            Ok(draft) if errors.is_empty() => Ok(draft),
            _ => Err(ContactsError::Invalid(FormErrors::from(errors))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{AVATAR_NOT_IMAGE, AVATAR_TOO_LARGE, MAX_AVATAR_BYTES, NAMES_MUST_DIFFER, REQUIRED};

    fn input(first: &str, last: &str, email: &str) -> ContactInput {
        ContactInput {
            first_name: first.into(),
            last_name: last.into(),
            email: email.into(),
            notes: String::new(),
        }
    }

    fn image(size: usize, content_type: &str) -> UploadedFile {
        UploadedFile {
            field: "avatar".into(),
            file_name: "avatar.jpg".into(),
            content_type: content_type.into(),
            data: vec![b'x'; size],
        }
    }

    #[test]
    fn valid_form_is_accepted() {
        let draft = ContactForm::bind(input("Ada", "Lovelace", "ada@example.com"))
            .clean()
            .unwrap();
        assert_eq!(draft.first_name, "Ada");
        assert_eq!(draft.avatar, AvatarChange::Keep);
    }

    #[test]
    fn values_are_trimmed() {
        let draft = ContactForm::bind(input("  Linus ", " Torvalds", " linus@example.com "))
            .clean()
            .unwrap();
        assert_eq!(draft.first_name, "Linus");
        assert_eq!(draft.last_name, "Torvalds");
        assert_eq!(draft.email, "linus@example.com");
    }

    #[test]
    fn first_and_last_name_must_differ() {
        let errors = ContactForm::bind(input("Ada", "Ada", "ada@example.com"))
            .clean()
            .unwrap_err();
        assert_eq!(errors.get("last_name"), [NAMES_MUST_DIFFER]);
        assert!(!errors.contains("first_name"));
    }

    #[test]
    fn cross_field_rule_skipped_when_a_name_is_invalid() {
        let long = "A".repeat(51);
        let errors = ContactForm::bind(input(&long, &long, "ada@example.com"))
            .clean()
            .unwrap_err();
        assert!(!errors.get("last_name").contains(&NAMES_MUST_DIFFER.to_string()));
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let errors = ContactForm::bind(ContactInput::default()).clean().unwrap_err();
        assert_eq!(errors.get("first_name"), [REQUIRED]);
        assert_eq!(errors.get("last_name"), [REQUIRED]);
        assert_eq!(errors.get("email"), [REQUIRED]);
        assert!(!errors.contains("notes"));
    }

    #[test]
    fn avatar_over_limit_is_rejected() {
        let errors = ContactForm::bind(input("Ada", "Lovelace", "ada@example.com"))
            .with_avatar(Some(image(MAX_AVATAR_BYTES + 1, "image/jpeg")))
            .clean()
            .unwrap_err();
        assert_eq!(errors.get("avatar"), [AVATAR_TOO_LARGE]);
    }

    #[test]
    fn avatar_at_limit_is_accepted() {
        let draft = ContactForm::bind(input("Ada", "Lovelace", "ada@example.com"))
            .with_avatar(Some(image(MAX_AVATAR_BYTES, "image/jpeg")))
            .clean()
            .unwrap();
        assert!(matches!(draft.avatar, AvatarChange::Replace(_)));
    }

    #[test]
    fn avatar_must_be_an_image() {
        let errors = ContactForm::bind(input("Ada", "Lovelace", "ada@example.com"))
            .with_avatar(Some(image(100, "application/pdf")))
            .clean()
            .unwrap_err();
        assert_eq!(errors.get("avatar"), [AVATAR_NOT_IMAGE]);
    }

    #[test]
    fn clear_is_ignored_on_create() {
        let draft = ContactForm::bind(input("Ada", "Lovelace", "ada@example.com"))
            .with_clear_avatar(true)
            .clean()
            .unwrap();
        assert_eq!(draft.avatar, AvatarChange::Keep);
    }

    #[test]
    fn clear_and_upload_together_is_rejected_on_edit() {
        let errors = ContactForm::bind(input("Ada", "Lovelace", "ada@example.com"))
            .for_instance(Id::generate())
            .with_avatar(Some(image(10, "image/png")))
            .with_clear_avatar(true)
            .clean()
            .unwrap_err();
        assert_eq!(errors.get("avatar"), [UPLOAD_AND_CLEAR]);
    }
}
