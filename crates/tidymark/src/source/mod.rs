//! Access to the bookmark service.
//!
//! [`BookmarkSource`] is the seam between the pipeline and the service. The
//! production implementation is [`RaindropClient`]; tests substitute an
//! in-memory fake.

mod raindrop;

pub use raindrop::{DEFAULT_BASE_URL, PAGE_SIZE, RaindropClient};

use crate::error::SourceError;
use crate::model::{Bookmark, BookmarkId, Collection, CollectionId, find_collection_by_name};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`BookmarkSource`] methods.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Paged reads and mutations against a bookmark collection service.
///
/// Pages are zero-based and have a fixed size owned by the implementation.
/// An `Ok` empty page means there is no more data.
pub trait BookmarkSource: Send + Sync {
    fn list_collections(&self) -> SourceFuture<'_, Vec<Collection>>;

    /// Bookmarks of `collection_id`, newest first.
    fn fetch_page(&self, collection_id: CollectionId, page: u32) -> SourceFuture<'_, Vec<Bookmark>>;

    fn delete(&self, bookmark_id: BookmarkId) -> SourceFuture<'_, ()>;

    fn move_to_collection(
        &self,
        bookmark_id: BookmarkId,
        collection_id: CollectionId,
    ) -> SourceFuture<'_, ()>;

    /// Resolve a display name against a collection list.
    fn resolve_collection_by_name(
        &self,
        collections: &[Collection],
        name: &str,
    ) -> Option<CollectionId> {
        find_collection_by_name(collections, name).map(|c| c.id)
    }
}
