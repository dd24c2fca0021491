//! Pixel operations on premultiplied RGBA8 buffers.

pub mod buffer;
pub mod composite;
pub mod shapes;
pub mod text;
