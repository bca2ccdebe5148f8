//! Configuration schema shared by the controller and its validators.

pub mod schema;

pub use schema::*;
