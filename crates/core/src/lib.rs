//! Domain logic for database instance monitoring.
//!
//! Everything in this crate is free of database and HTTP concerns so it can
//! be tested in isolation. Data access is abstracted behind the source traits
//! in [`monitoring`].

pub mod error;
pub mod monitoring;
pub mod types;
