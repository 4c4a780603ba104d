//! Change signalling for form fields

mod version_store;

pub use version_store::{Subscription, VersionStore, Versions};
