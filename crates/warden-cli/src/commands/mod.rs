//! CLI command implementations for the Warden token tool.

pub mod secret;
pub mod token;
