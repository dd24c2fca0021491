//! Getting the source video, its metadata and the author avatar onto local disk.

pub mod avatar;
pub mod source;
