use serde::{Deserialize, Serialize};
use std::fmt;

use super::contact::Contact;
use super::ids::Id;

pub const LABEL_MAX: usize = 20;
pub const LINE_MAX: usize = 100;
pub const CITY_MAX: usize = 50;
pub const COUNTRY_MAX: usize = 50;

/// The editable part of an address, without identity or owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressData {
    /// "Home", "Work", etc.
    pub label: String,
    pub line1: String,
    pub line2: String,
    pub city: String,
    pub country: String,
}

/// A postal address belonging to exactly one contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub id: Id<Address>,
    pub contact_id: Id<Contact>,
    pub label: String,
    pub line1: String,
    pub line2: String,
    pub city: String,
    pub country: String,
}

impl Address {
    pub fn create(contact_id: Id<Contact>, data: AddressData) -> Self {
        Self {
            id: Id::generate(),
            contact_id,
            label: data.label,
            line1: data.line1,
            line2: data.line2,
            city: data.city,
            country: data.country,
        }
    }

    pub fn data(&self) -> AddressData {
        AddressData {
            label: self.label.clone(),
            line1: self.line1.clone(),
            line2: self.line2.clone(),
            city: self.city.clone(),
            country: self.country.clone(),
        }
    }

    pub fn apply(&mut self, data: AddressData) {
        self.label = data.label;
        self.line1 = data.line1;
        self.line2 = data.line2;
        self.city = data.city;
        self.country = data.country;
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}, {}", self.label, self.line1, self.city)
    }
}
