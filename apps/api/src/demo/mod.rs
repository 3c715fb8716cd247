//! Demo mode: visitors bring their own CV (upload, pasted text or guided
//! form) and the assistant answers from it instead of the owner's profile.

pub mod extract;
pub mod flow;
pub mod form;
pub mod handlers;
pub mod preview;
pub mod sanitize;
