//! Raindrop.io REST client.

use super::{BookmarkSource, SourceFuture};
use crate::error::SourceError;
use crate::model::{Bookmark, BookmarkId, Collection, CollectionId};
use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.raindrop.io/rest/v1";

/// Bookmarks per page requested from `/raindrops/{collection}`.
pub const PAGE_SIZE: u32 = 50;

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Deserialize, Debug)]
struct ItemsResponse<T> {
    #[serde(default)]
    result: Option<bool>,
    #[serde(default, rename = "errorMessage")]
    error_message: Option<String>,
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Deserialize, Debug)]
struct StatusResponse {
    #[serde(default)]
    result: Option<bool>,
    #[serde(default, rename = "errorMessage")]
    error_message: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RawCollection {
    #[serde(rename = "_id")]
    id: CollectionId,
    title: Option<String>,
    count: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct RawRaindrop {
    #[serde(rename = "_id")]
    id: BookmarkId,
    title: Option<String>,
    link: Option<String>,
    domain: Option<String>,
    excerpt: Option<String>,
    created: Option<String>,
    collection: Option<RawCollectionRef>,
}

#[derive(Deserialize, Debug)]
struct RawCollectionRef {
    #[serde(rename = "$id")]
    id: Option<CollectionId>,
}

impl From<RawCollection> for Collection {
    fn from(raw: RawCollection) -> Self {
        Collection {
            id: raw.id,
            title: raw.title.unwrap_or_default(),
            count: raw.count.unwrap_or(0),
        }
    }
}

impl From<RawRaindrop> for Bookmark {
    fn from(raw: RawRaindrop) -> Self {
        let title = raw
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "Untitled".to_string());
        Bookmark {
            id: raw.id,
            title,
            link: raw.link.unwrap_or_default(),
            domain: raw.domain.unwrap_or_default(),
            excerpt: raw.excerpt.unwrap_or_default(),
            created: raw.created.unwrap_or_default(),
            collection_id: raw.collection.and_then(|c| c.id),
        }
    }
}

fn check_result(result: Option<bool>, message: Option<String>) -> Result<(), SourceError> {
    if result == Some(false) {
        return Err(SourceError::Rejected(
            message.unwrap_or_else(|| "result: false".to_string()),
        ));
    }
    Ok(())
}

// ── Client ─────────────────────────────────────────────────────────

/// Async HTTP client for the Raindrop.io REST API, authenticated with a
/// test token or OAuth access token.
pub struct RaindropClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl RaindropClient {
    pub fn new(token: impl Into<String>) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tidymark/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at another server (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> Result<Url, SourceError> {
        let raw = format!("{}{path}", self.base_url);
        let parsed = if params.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, params)
        };
        parsed.map_err(|e| SourceError::Url(format!("{raw}: {e}")))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, SourceError> {
        let start = Instant::now();
        let resp = request.bearer_auth(&self.token).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        debug!(
            "Raindrop response: HTTP {} in {:.2}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }

    async fn get_items<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, SourceError> {
        debug!("GET {url}");
        let text = self.send(self.client.get(url)).await?;
        let parsed: ItemsResponse<T> = serde_json::from_str(&text)?;
        check_result(parsed.result, parsed.error_message)?;
        Ok(parsed.items)
    }

    async fn expect_ok(&self, request: reqwest::RequestBuilder) -> Result<(), SourceError> {
        let text = self.send(request).await?;
        // Some endpoints answer with an empty body.
        if text.trim().is_empty() {
            return Ok(());
        }
        let parsed: StatusResponse = serde_json::from_str(&text)?;
        check_result(parsed.result, parsed.error_message)
    }

    async fn collections(&self) -> Result<Vec<Collection>, SourceError> {
        let roots: Vec<RawCollection> = self.get_items(self.url("/collections", &[])?).await?;
        let mut collections: Vec<Collection> = roots.into_iter().map(Collection::from).collect();

        // Nested collections are valid move targets too.
        match self
            .get_items::<RawCollection>(self.url("/collections/childrens", &[])?)
            .await
        {
            Ok(children) => {
                for child in children.into_iter().map(Collection::from) {
                    if !collections.iter().any(|c| c.id == child.id) {
                        collections.push(child);
                    }
                }
            }
            Err(e) => warn!("Could not list nested collections: {e}"),
        }
        Ok(collections)
    }
}

impl BookmarkSource for RaindropClient {
    fn list_collections(&self) -> SourceFuture<'_, Vec<Collection>> {
        Box::pin(async move {
            self.collections().await.inspect_err(|e| {
                warn!("Failed to list collections: {e}");
            })
        })
    }

    fn fetch_page(&self, collection_id: CollectionId, page: u32) -> SourceFuture<'_, Vec<Bookmark>> {
        Box::pin(async move {
            let url = self.url(
                &format!("/raindrops/{collection_id}"),
                &[
                    ("page", page.to_string()),
                    ("perpage", PAGE_SIZE.to_string()),
                    ("sort", "-created".to_string()),
                ],
            )?;
            let items: Vec<RawRaindrop> = self.get_items(url).await.inspect_err(|e| {
                warn!("Failed to fetch page {page} of collection {collection_id}: {e}");
            })?;
            debug!(
                "Fetched {} bookmarks from collection {collection_id}, page {page}",
                items.len()
            );
            Ok(items.into_iter().map(Bookmark::from).collect())
        })
    }

    fn delete(&self, bookmark_id: BookmarkId) -> SourceFuture<'_, ()> {
        Box::pin(async move {
            let url = self.url(&format!("/raindrop/{bookmark_id}"), &[])?;
            debug!("DELETE {url}");
            self.expect_ok(self.client.delete(url))
                .await
                .inspect_err(|e| warn!("Failed to delete bookmark {bookmark_id}: {e}"))
        })
    }

    fn move_to_collection(
        &self,
        bookmark_id: BookmarkId,
        collection_id: CollectionId,
    ) -> SourceFuture<'_, ()> {
        Box::pin(async move {
            let url = self.url(&format!("/raindrop/{bookmark_id}"), &[])?;
            debug!("PUT {url} -> collection {collection_id}");
            let body = serde_json::json!({ "collection": { "$id": collection_id } });
            self.expect_ok(self.client.put(url).json(&body))
                .await
                .inspect_err(|e| {
                    warn!("Failed to move bookmark {bookmark_id} to {collection_id}: {e}");
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raindrop_item_defaults() {
        let raw: RawRaindrop = serde_json::from_str(
            r#"{"_id": 5, "title": "", "link": "https://x.io", "collection": {"$id": 9}}"#,
        )
        .unwrap();
        let bookmark = Bookmark::from(raw);
        assert_eq!(bookmark.title, "Untitled");
        assert_eq!(bookmark.link, "https://x.io");
        assert_eq!(bookmark.domain, "");
        assert_eq!(bookmark.collection_id, Some(9));
    }

    #[test]
    fn page_url_carries_paging_params() {
        let client = RaindropClient::new("t")
            .unwrap()
            .with_base_url("http://localhost:1/rest/v1/");
        let url = client
            .url(
                "/raindrops/42",
                &[("page", "3".into()), ("perpage", "50".into())],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:1/rest/v1/raindrops/42?page=3&perpage=50"
        );
    }

    #[test]
    fn result_false_is_rejected() {
        assert!(matches!(
            check_result(Some(false), Some("nope".into())),
            Err(SourceError::Rejected(msg)) if msg == "nope"
        ));
        assert!(check_result(None, None).is_ok());
    }
}
