//! Domain models.

pub mod academics;
pub mod identity;
