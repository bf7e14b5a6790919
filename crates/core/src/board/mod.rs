//! Kanban board layout and move descriptors
//!
//! This module provides the column layout, the snapshot view derived from the
//! task collection, and the typed form of a drag-and-drop gesture.

mod model;
mod moves;

pub use model::*;
pub use moves::*;
