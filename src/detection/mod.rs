//! Sheet detection module
//!
//! This module locates the printed sheet inside a photograph using its
//! coloured corner markers and crops it into sheet space.

pub mod sheet;

pub use sheet::{LocatedSheet, MarkerQuad, SheetLocator};
