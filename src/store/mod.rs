//! Session persistence.
//!
//! The whole in-progress session is kept as one JSON blob under a fixed key,
//! so a quiz survives restarts of the program.
//!
//! # Architecture
//!
//! * [`data`]: the serializable blob and its conversion to and from a live session.
//! * [`io`]: storage media ([`FileStore`], [`MemoryStore`]) and the [`SessionStore`]
//!   that saves, loads and clears the blob.
//!
//! A blob that is missing, unparsable or inconsistent is never an error: it
//! reads as "no saved session" and the quiz starts fresh.

pub mod data;
pub mod io;

pub use data::SessionBlob;
pub use io::{FileStore, KeyValueStore, MemoryStore, SessionStore, SESSION_KEY};
