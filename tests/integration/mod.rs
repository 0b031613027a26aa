//! Integration test modules for saber-midi

pub mod archive;
pub mod controls;
pub mod lifecycle;
pub mod notes;
