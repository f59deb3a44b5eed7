//! Shipping implementations of the `tally-core` collaborator seams: one set
//! backed by sqlite, one in-memory set for tests and local runs.

pub mod account;
pub mod expense;
pub mod memory;
pub mod session;

pub use account::SqlAccountDirectory;
pub use expense::SqlExpenseLedger;
pub use memory::{InMemoryAccountDirectory, InMemoryExpenseLedger, InMemorySessionCache};
pub use session::SqlSessionCache;
