use std::{fmt, str::FromStr, sync::Arc};

use crate::domain::MemeRepository;
use crate::errors::MemeError;
use crate::models::Meme;

pub const MAX_PAGE_SIZE: u32 = 100;

/// What an empty list page means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListPolicy {
    /// An empty page is a normal, empty result.
    #[default]
    EmptyList,
    /// An empty page is reported as not found.
    NotFound,
}

impl FromStr for ListPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "empty" | "empty_list" => Ok(ListPolicy::EmptyList),
            "not_found" | "404" => Ok(ListPolicy::NotFound),
            other => Err(format!("unknown empty list policy '{}'", other)),
        }
    }
}

impl fmt::Display for ListPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListPolicy::EmptyList => f.write_str("empty"),
            ListPolicy::NotFound => f.write_str("not_found"),
        }
    }
}

/// Read-only access to meme rows. Never touches the content store.
#[derive(Clone)]
pub struct MemeReader {
    repo: Arc<dyn MemeRepository>,
    policy: ListPolicy,
}

impl MemeReader {
    pub fn new(repo: Arc<dyn MemeRepository>, policy: ListPolicy) -> Self {
        tracing::info!(%policy, "Initializing MemeReader");
        Self { repo, policy }
    }

    /// A page of memes in insertion order. `limit` is capped at `MAX_PAGE_SIZE`;
    /// a zero limit asks for nothing and gets an empty page under either policy.
    pub async fn list(&self, offset: u32, limit: u32) -> Result<Vec<Meme>, MemeError> {
        let limit = limit.min(MAX_PAGE_SIZE);
        if limit == 0 {
            return Ok(Vec::new());
        }
        let memes = self.repo.list(offset, limit).await?;
        tracing::debug!(offset, limit, count = memes.len(), "Listed memes");

        if memes.is_empty() && self.policy == ListPolicy::NotFound {
            return Err(MemeError::EmptyPage { offset });
        }
        Ok(memes)
    }

    pub async fn get(&self, id: i64) -> Result<Meme, MemeError> {
        self.repo.get_by_id(id).await?.ok_or(MemeError::NotFound(id))
    }
}
