pub mod handlers;
pub mod prompts;
pub mod render;
pub mod validation;
