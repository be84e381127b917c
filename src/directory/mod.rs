//! Stream directory collaborator
//!
//! The directory is the external REST service that owns stream records
//! (create/list/activate/deactivate/delete). The console core only reads
//! the stream set from it and mirrors activation flags into live
//! connections; persistence and auth live on the server side.

pub mod client;
pub mod types;

pub use client::DirectoryClient;
pub use types::{NewStream, StreamRecord};
