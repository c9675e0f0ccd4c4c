//! Page source trait

use async_trait::async_trait;
use odx_core::Page;

use crate::FetchError;

/// Paging window for a single request (`$top` / `$skip`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub top: u64,
    pub skip: u64,
}

/// Trait for remote collections that can be read one page at a time
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page described by `request`
    async fn fetch(&self, request: PageRequest) -> Result<Page, FetchError>;
}
