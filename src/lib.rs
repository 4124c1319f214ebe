//! Client library for the task & employee management API: typed REST
//! access, a credential-holding session, and polled local mirrors with
//! optimistic edits.

pub mod api;
pub mod config;
pub mod errors;
pub mod format;
pub mod models;
pub mod session;
pub mod sync;

pub use api::ApiClient;
pub use config::Config;
pub use errors::ApiError;
pub use session::{AuthState, Credentials, Session};
