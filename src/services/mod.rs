//! Typed clients for the remote service's routes.

pub mod items_api;
pub mod run;
