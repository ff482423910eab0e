//! User records and profiles.

mod models;
pub(crate) mod repository;

pub use models::{Gender, IdentitySnapshot, PhotoRef, Profile, ProfileView, User, UserRow};
pub use repository::UserRepository;
