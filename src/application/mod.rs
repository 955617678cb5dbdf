//! Rendering services built on the domain types.

pub mod elements;
pub mod error;
pub mod markdown;
pub mod mentions;
pub mod render;
