//! API integration tests
//!
//! The router runs in-process against the in-memory stores.

mod assets;
mod common;
mod imports;
mod users;
