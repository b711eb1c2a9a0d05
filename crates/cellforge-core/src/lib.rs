//! # Cellforge Core
//!
//! Hierarchical circuit-graph database with per-cell layout geometry,
//! topological root resolution, technology layer data, and the geometric
//! primitives used for spacing and placement decisions.
//!
//! This crate is the heart of the Cellforge layout kernel.

pub mod cell;
pub mod database;
pub mod geometry;
pub mod grid;
pub mod tech;

pub use cell::{Cell, CellIndex, CellLayout, Instance, InstanceKind, Orient};
pub use database::{DbError, DesignDb};
pub use geometry::{Point, Rect};
pub use grid::Grid2D;
pub use tech::{Tech, TechError, TechUnits};
