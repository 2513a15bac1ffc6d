pub mod ids;
pub mod contact;
pub mod address;

// Re-exports for convenience
pub use ids::Id;
pub use contact::Contact;
pub use address::{Address, AddressData};
