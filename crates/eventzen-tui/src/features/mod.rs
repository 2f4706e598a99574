//! Feature slices for the shell (state/update/render per slice).

pub mod auth;
pub mod location;
pub mod nav;
pub mod search;
