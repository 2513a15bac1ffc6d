pub mod contact_ops;
pub mod address_ops;
