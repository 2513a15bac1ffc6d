use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::model::address::{CITY_MAX, COUNTRY_MAX, LABEL_MAX, LINE_MAX};
use crate::model::{Address, AddressData, Id};
use crate::validation::{self, FieldErrors};

use super::fields::FormFields;

/// Field-name prefix of the address rows in an HTML form.
pub const PREFIX: &str = "addresses";
/// Hard cap on the number of rows accepted in one submission.
pub const MAX_ROWS: usize = 1000;

pub const MANAGEMENT_FORM_INVALID: &str =
    "ManagementForm data is missing or has been tampered with.";
pub const TOO_MANY_ROWS: &str = "Please submit at most 1000 forms.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const DUPLICATE_ID: &str = "Please correct the duplicate data for id, which must be unique.";

/// One submitted address row. `id` is set for rows that edit an existing
/// address and blank for new rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressRowInput {
    pub id: Option<String>,
    pub label: String,
    pub line1: String,
    pub line2: String,
    pub city: String,
    pub country: String,
    pub delete: bool,
}

impl AddressRowInput {
    pub fn from_address(address: &Address) -> Self {
        Self {
            id: Some(address.id.to_string()),
            label: address.label.clone(),
            line1: address.line1.clone(),
            line2: address.line2.clone(),
            city: address.city.clone(),
            country: address.country.clone(),
            delete: false,
        }
    }

    /// True when every data field is blank.
    pub fn is_blank(&self) -> bool {
        [&self.label, &self.line1, &self.line2, &self.city, &self.country]
            .iter()
            .all(|v| v.trim().is_empty())
    }

    fn existing_id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    fn clean(&self) -> Result<AddressData, FieldErrors> {
        let mut errors = FieldErrors::new();
        let label = errors.check("label", validation::required(&self.label, LABEL_MAX));
        let line1 = errors.check("line1", validation::required(&self.line1, LINE_MAX));
        let line2 = errors.check("line2", validation::optional(&self.line2, Some(LINE_MAX)));
        let city = errors.check("city", validation::required(&self.city, CITY_MAX));
        let country = errors.check("country", validation::required(&self.country, COUNTRY_MAX));

        match (label, line1, line2, city, country) {
            (Some(label), Some(line1), Some(line2), Some(city), Some(country)) => Ok(AddressData {
                label,
                line1,
                line2,
                city,
                country,
            }),
            _ => Err(errors),
        }
    }
}

/// A change to apply to a contact's addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowCommand {
    Insert(AddressData),
    Update(Id<Address>, AddressData),
    Delete(Id<Address>),
}

/// Errors of a formset: per-row field errors keyed by row index, plus errors
/// that belong to the set as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormSetErrors {
    pub non_row: Vec<String>,
    pub rows: BTreeMap<usize, FieldErrors>,
}

impl FormSetErrors {
    pub fn is_empty(&self) -> bool {
        self.non_row.is_empty() && self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&FieldErrors> {
        self.rows.get(&index)
    }
}

/// Editor for the variable-size set of addresses attached to one contact.
#[derive(Debug, Clone, Default)]
pub struct AddressFormSet {
    rows: Vec<AddressRowInput>,
    management_error: Option<&'static str>,
}

impl AddressFormSet {
    pub fn new(rows: Vec<AddressRowInput>) -> Self {
        let management_error = (rows.len() > MAX_ROWS).then_some(TOO_MANY_ROWS);
        Self {
            rows,
            management_error,
        }
    }

    /// Decodes the `addresses-TOTAL_FORMS` / `addresses-{i}-{field}` encoding
    /// of an HTML form.
    pub fn from_fields(fields: &FormFields) -> Self {
        let declared = fields
            .get(&format!("{}-TOTAL_FORMS", PREFIX))
            .and_then(|v| v.trim().parse::<usize>().ok());

        let Some(total) = declared else {
            return Self {
                rows: Vec::new(),
                management_error: Some(MANAGEMENT_FORM_INVALID),
            };
        };
        if total > MAX_ROWS {
            return Self {
                rows: Vec::new(),
                management_error: Some(TOO_MANY_ROWS),
            };
        }

        let rows = (0..total)
            .map(|i| {
                let name = |field: &str| format!("{}-{}-{}", PREFIX, i, field);
                AddressRowInput {
                    id: fields.get(&name("id")).map(str::to_string),
                    label: fields.text(&name("label")),
                    line1: fields.text(&name("line1")),
                    line2: fields.text(&name("line2")),
                    city: fields.text(&name("city")),
                    country: fields.text(&name("country")),
                    delete: fields.checked(&name("DELETE")),
                }
            })
            .collect();

        Self {
            rows,
            management_error: None,
        }
    }

    /// Rows for an unbound edit form: the existing addresses followed by
    /// `extra` blank rows.
    pub fn initial(existing: &[Address], extra: usize) -> Self {
        let mut rows: Vec<AddressRowInput> =
            existing.iter().map(AddressRowInput::from_address).collect();
        rows.extend(std::iter::repeat_with(AddressRowInput::default).take(extra));
        Self::new(rows)
    }

    pub fn rows(&self) -> &[AddressRowInput] {
        &self.rows
    }

    /// Validates every row against the contact's current addresses and
    /// returns the commands needed to bring the store in line with the
    /// submission. Unchanged rows produce no command.
    pub fn clean(&self, existing: &[Address]) -> Result<Vec<RowCommand>, FormSetErrors> {
        let mut errors = FormSetErrors::default();
        if let Some(message) = self.management_error {
            errors.non_row.push(message.to_string());
            return Err(errors);
        }

        let mut commands = Vec::new();
        let mut seen: HashSet<Id<Address>> = HashSet::new();

        for (index, row) in self.rows.iter().enumerate() {
            let current = match row.existing_id() {
                None => None,
                Some(raw) => {
                    let found = Id::<Address>::parse(raw)
                        .ok()
                        .and_then(|id| existing.iter().find(|a| a.id == id));
                    match found {
                        Some(address) => Some(address),
                        None => {
                            errors.rows.entry(index).or_default().add("id", INVALID_CHOICE);
                            continue;
                        }
                    }
                }
            };

            if let Some(address) = current {
                if !seen.insert(address.id) {
                    if !errors.non_row.iter().any(|m| m == DUPLICATE_ID) {
                        errors.non_row.push(DUPLICATE_ID.to_string());
                    }
                    continue;
                }
            }

            // Deletion wins over whatever else the row carries.
            if row.delete {
                if let Some(address) = current {
                    commands.push(RowCommand::Delete(address.id));
                }
                continue;
            }

            if current.is_none() && row.is_blank() {
                continue;
            }

            match row.clean() {
                Err(row_errors) => {
                    errors.rows.entry(index).or_default().merge(row_errors);
                }
                Ok(data) => match current {
                    None => commands.push(RowCommand::Insert(data)),
                    Some(address) if address.data() != data => {
                        commands.push(RowCommand::Update(address.id, data))
                    }
                    Some(_) => {}
                },
            }
        }

        if errors.is_empty() {
            Ok(commands)
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Contact;
    use crate::validation::REQUIRED;

    fn home() -> AddressRowInput {
        AddressRowInput {
            label: "Home".into(),
            line1: "123 Main St".into(),
            city: "Test City".into(),
            country: "USA".into(),
            ..Default::default()
        }
    }

    fn stored(contact_id: Id<Contact>) -> Address {
        Address::create(
            contact_id,
            AddressData {
                label: "Work".into(),
                line1: "1 Infinite Loop".into(),
                line2: String::new(),
                city: "Cupertino".into(),
                country: "USA".into(),
            },
        )
    }

    #[test]
    fn zero_rows_is_valid() {
        assert!(AddressFormSet::new(vec![]).clean(&[]).unwrap().is_empty());
    }

    #[test]
    fn blank_extra_row_is_skipped() {
        let set = AddressFormSet::new(vec![AddressRowInput::default()]);
        assert!(set.clean(&[]).unwrap().is_empty());
    }

    #[test]
    fn new_row_becomes_insert() {
        let set = AddressFormSet::new(vec![home()]);
        let commands = set.clean(&[]).unwrap();
        assert!(matches!(&commands[..], [RowCommand::Insert(d)] if d.label == "Home"));
    }

    #[test]
    fn partially_filled_row_reports_missing_fields() {
        let row = AddressRowInput {
            label: "Home".into(),
            ..Default::default()
        };
        let errors = AddressFormSet::new(vec![AddressRowInput::default(), row])
            .clean(&[])
            .unwrap_err();
        let row_errors = errors.row(1).unwrap();
        assert_eq!(row_errors.get("line1"), [REQUIRED]);
        assert_eq!(row_errors.get("city"), [REQUIRED]);
        assert_eq!(row_errors.get("country"), [REQUIRED]);
        assert!(!row_errors.contains("line2"));
        assert!(errors.row(0).is_none());
    }

    #[test]
    fn unchanged_existing_row_yields_nothing() {
        let address = stored(Id::generate());
        let set = AddressFormSet::initial(std::slice::from_ref(&address), 1);
        assert!(set.clean(&[address]).unwrap().is_empty());
    }

    #[test]
    fn changed_existing_row_becomes_update() {
        let address = stored(Id::generate());
        let mut row = AddressRowInput::from_address(&address);
        row.city = "Palo Alto".into();
        let commands = AddressFormSet::new(vec![row]).clean(&[address.clone()]).unwrap();
        assert!(
            matches!(&commands[..], [RowCommand::Update(id, d)] if *id == address.id && d.city == "Palo Alto")
        );
    }

    #[test]
    fn delete_takes_precedence_over_invalid_edits() {
        let address = stored(Id::generate());
        let mut row = AddressRowInput::from_address(&address);
        row.label = "x".repeat(LABEL_MAX + 5);
        row.delete = true;
        let commands = AddressFormSet::new(vec![row]).clean(&[address.clone()]).unwrap();
        assert_eq!(commands, vec![RowCommand::Delete(address.id)]);
    }

    #[test]
    fn deleting_a_new_row_is_a_no_op() {
        let mut row = home();
        row.delete = true;
        assert!(AddressFormSet::new(vec![row]).clean(&[]).unwrap().is_empty());
    }

    #[test]
    fn foreign_id_is_rejected() {
        let mut row = home();
        row.id = Some(Id::<Address>::generate().to_string());
        let errors = AddressFormSet::new(vec![row]).clean(&[]).unwrap_err();
        assert_eq!(errors.row(0).unwrap().get("id"), [INVALID_CHOICE]);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let address = stored(Id::generate());
        let row = AddressRowInput::from_address(&address);
        let errors = AddressFormSet::new(vec![row.clone(), row])
            .clean(&[address])
            .unwrap_err();
        assert_eq!(errors.non_row, vec![DUPLICATE_ID.to_string()]);
    }

    #[test]
    fn from_fields_reads_declared_rows() {
        let fields: FormFields = [
            ("addresses-TOTAL_FORMS", "1"),
            ("addresses-INITIAL_FORMS", "0"),
            ("addresses-0-label", "Home"),
            ("addresses-0-line1", "123 Main St"),
            ("addresses-0-line2", ""),
            ("addresses-0-city", "Test City"),
            ("addresses-0-country", "USA"),
        ]
        .into_iter()
        .collect();
        let set = AddressFormSet::from_fields(&fields);
        assert_eq!(set.rows().len(), 1);
        assert_eq!(set.clean(&[]).unwrap().len(), 1);
    }

    #[test]
    fn rows_beyond_declared_total_are_ignored() {
        let fields: FormFields = [
            ("addresses-TOTAL_FORMS", "0"),
            ("addresses-0-label", "Home"),
            ("addresses-0-line1", "123 Main St"),
        ]
        .into_iter()
        .collect();
        assert!(AddressFormSet::from_fields(&fields).clean(&[]).unwrap().is_empty());
    }

    #[test]
    fn missing_management_field_is_rejected() {
        let fields: FormFields = [("addresses-0-label", "Home")].into_iter().collect();
        let errors = AddressFormSet::from_fields(&fields).clean(&[]).unwrap_err();
        assert_eq!(errors.non_row, vec![MANAGEMENT_FORM_INVALID.to_string()]);
    }

    #[test]
    fn declared_total_is_capped() {
        let fields: FormFields = [("addresses-TOTAL_FORMS", "1001")].into_iter().collect();
        let errors = AddressFormSet::from_fields(&fields).clean(&[]).unwrap_err();
        assert_eq!(errors.non_row, vec![TOO_MANY_ROWS.to_string()]);
    }
}
