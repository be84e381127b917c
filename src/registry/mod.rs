//! Connection registry
//!
//! Tracks one connection driver per stream id and reconciles the set of
//! live connections against the directory's stream list. The registry's
//! map is the only shared mutable structure in the crate; drivers never
//! touch it.

pub mod store;

pub use store::ConnectionRegistry;
