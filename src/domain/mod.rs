//! Domain types served by the demo API

pub mod tasks;

pub use tasks::*;
