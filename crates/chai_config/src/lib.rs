//! Project settings for chai: the per-project layout and its on-disk store.
//!
//! A project's layout names its compiler, flags, header and source roots,
//! libraries, language standard and worker count. The build engine reads it
//! through [`ProjectLayout`] accessors, which enforce that the single-valued
//! fields are present.

#![warn(missing_docs)]

pub mod error;
pub mod layout;
pub mod store;

pub use error::ConfigError;
pub use layout::{LayoutField, ProjectLayout};
pub use store::{read_layout, read_layout_from_str, read_project, write_layout, write_project};
