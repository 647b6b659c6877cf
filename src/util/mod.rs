//! Small shared helpers.

pub mod ease;
