//! Host platform detection.

pub mod os;

pub use os::{Os, default_archive_format};
