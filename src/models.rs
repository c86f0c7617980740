use serde::{Deserialize, Serialize};

/// A persisted meme row.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Meme {
    pub id: i64,
    pub title: String,
    pub image_url: String,
    pub description: String,
}

/// Row values before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMeme {
    pub title: String,
    pub description: String,
    pub image_url: String,
}

/// An uploaded image as received from the client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Field changes for an update. `None` means "leave unchanged".
#[derive(Debug, Clone, Default)]
pub struct MemePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<ImageUpload>,
}

/// Offset/limit query for the public list endpoint.
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct Pagination {
    #[serde(default)]
    pub skip: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    10
}
