//! wit.ai client: turns a raw chat message into the entity extraction the
//! dialogue engine classifies against.

pub mod client;

pub use client::{NlpClient, NlpError};
