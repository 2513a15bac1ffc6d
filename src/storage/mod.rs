pub mod avatar_store;

pub use avatar_store::AvatarStore;
