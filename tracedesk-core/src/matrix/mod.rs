//! Traceability matrix state container
//!
//! Holds the matrix rows (one per requirement) and the independent list of
//! requirement ↔ test case mappings. All changes go through
//! [`MatrixAction`]s; remote operations live on [`MatrixStore`].

mod state;
mod store;

pub use state::{MatrixAction, MatrixState};
pub use store::{MatrixSource, MatrixStore, RefreshTicket};
