//! Data types shared by the facade, its collaborators and the HTTP surface.
//!
//! - `repository`: Repository descriptor resolved from a URL (credentials, hints)
//! - `content`: FileSet / DirectoryList results and their JSON response bodies

pub mod content;
pub mod repository;

pub use content::*;
pub use repository::*;
