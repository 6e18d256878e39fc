//! Domain models for WorldNotes.
//!
//! # Core Concepts
//!
//! ## Map Entities
//!
//! - [`Map`]: A raster image that everything else is placed on.
//! - [`Annotation`]: A point of interest, with an `unlocked` flag used by progression.
//! - [`Media`]: Images, sounds or links attached to an annotation.
//! - [`MapPath`]: A polyline such as a road or a river.
//! - [`MapShape`]: A polygonal zone such as a region.
//! - [`Layer`]: Optional grouping of annotations, shapes and paths.
//!
//! ## Mission Graph
//!
//! - [`Mission`]: A quest-like task with a status and a priority.
//! - [`DependencyEdge`]: "mission requires required-mission to be completed".
//! - [`MissionAnnotationLink`] / [`MissionPathLink`]: Many-to-many links to map entities.
//! - [`ProgressionReport`]: Derived completion and unlock percentages.
//!
//! Unlock state is derived, never stored; see [`crate::graph`].

mod annotation;
mod layer;
mod link;
mod map;
mod mission;
mod path;
mod progression;
mod shape;
mod transfer;

pub use annotation::*;
pub use layer::*;
pub use link::*;
pub use map::*;
pub use mission::*;
pub use path::*;
pub use progression::*;
pub use shape::*;
pub use transfer::*;
