pub mod catalog;
pub mod handlers;
pub mod merge;
pub mod models;

pub use catalog::ProfileCatalog;
pub use merge::merge;
pub use models::{ProfileOverride, ProfileRecord};
