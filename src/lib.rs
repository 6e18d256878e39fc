//! WorldNotes: map annotations with a mission dependency and progression engine.

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod graph;
pub mod models;

pub use error::{Error, Result};
