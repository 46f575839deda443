//! Query results and their JSON response bodies.
//!
//! - `FileSet`: repository-relative path -> raw file content
//! - `DirectoryList`: repository-relative directory paths, order irrelevant
//! - `FilesResponse` / `DirectoriesResponse`: bodies served by the routes

use std::collections::{BTreeMap, HashMap};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

pub type FileSet = HashMap<String, Vec<u8>>;

pub type DirectoryList = Vec<String>;

/// File contents are base64 encoded so binary files survive JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesResponse {
    pub items: BTreeMap<String, String>,
}

impl From<FileSet> for FilesResponse {
    fn from(files: FileSet) -> Self {
        let items = files
            .into_iter()
            .map(|(path, content)| (path, STANDARD.encode(content)))
            .collect();
        Self { items }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoriesResponse {
    pub items: DirectoryList,
}

impl From<DirectoryList> for DirectoriesResponse {
    fn from(mut items: DirectoryList) -> Self {
        items.sort();
        Self { items }
    }
}
