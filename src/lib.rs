//! Course search client.
//!
//! A [`session::QuerySession`] keeps autocomplete, spell checking, search and
//! catalog paging consistent while network responses race each other; an
//! [`Orchestrator`] runs one on tokio against a [`CourseBackend`].

pub mod backend;
pub mod config;
pub mod console;
pub mod error;
pub mod favorites;
pub mod filters;
pub mod model;
pub mod orchestrator;
pub mod session;
pub mod util;

pub use backend::{CourseBackend, HttpBackend};
pub use config::{ClientConfig, SpellFailurePolicy};
pub use error::{BackendError, Operation};
pub use orchestrator::{Orchestrator, OrchestratorHandle};
pub use session::view::ViewState;
