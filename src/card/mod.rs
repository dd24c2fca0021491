//! Card image construction.

pub mod metadata;
pub mod renderer;
