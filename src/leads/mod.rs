//! Leads: the record type, its validation, and its on-disk store.

pub mod model;
pub mod store;
pub mod validate;

pub use model::{Budget, ContactForm, HEADER, Lead, LeadRow, Topic};
pub use store::LeadStore;
pub use validate::{is_valid_email, validate};
