//! Core library for the task board
//!
//! This crate contains the core business logic, including:
//! - Task model and board layout
//! - Drag-and-drop reordering
//! - The client-side task cache and its search/sort view
//! - The backend gateway (HTTP client and file-backed store)

pub mod board;
pub mod error;
pub mod gateway;
pub mod reorder;
pub mod store;
pub mod task;
pub mod view;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
