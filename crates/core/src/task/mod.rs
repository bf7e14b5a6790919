//! Task module
//!
//! This module contains task-related types and the file-backed task store.

mod file_store;
mod model;

pub use file_store::FileTaskStore;
pub use model::*;
