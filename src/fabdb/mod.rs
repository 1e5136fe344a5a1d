//! fabdb.net card source.
//!
//! [`CardSource`] is what the bot depends on; [`FabDbClient`] implements it
//! against the public REST API.

mod client;
mod models;

use async_trait::async_trait;
use tracing::debug;

use client::Client;
use models::SearchResponse;

pub use client::{ApiError, ClientOptions, DEFAULT_ENDPOINT};
pub use models::{Card, unique_sets_from_printings};

/// Fixed page size for card searches.
pub const SEARCH_PAGE_SIZE: &str = "30";

/// Card lookups used by the bot handlers.
#[async_trait]
pub trait CardSource: Send + Sync {
    /// Search cards by free-text keywords.
    ///
    /// An empty result is reported as [`ApiError::NoCards`].
    async fn list_cards(&self, query: &str) -> Result<Vec<Card>, ApiError>;

    /// Fetch one card by identifier (case-insensitive).
    async fn get_card(&self, identifier: &str) -> Result<Card, ApiError>;
}

/// fabdb.net implementation of [`CardSource`].
#[derive(Debug, Clone)]
pub struct FabDbClient {
    client: Client,
}

impl FabDbClient {
    pub fn new(options: ClientOptions) -> Result<Self, ApiError> {
        Ok(Self {
            client: Client::new(options)?,
        })
    }
}

#[async_trait]
impl CardSource for FabDbClient {
    async fn list_cards(&self, query: &str) -> Result<Vec<Card>, ApiError> {
        let result: SearchResponse = self
            .client
            .get(
                &["cards"],
                &[
                    ("per_page", SEARCH_PAGE_SIZE),
                    ("keywords", query),
                    ("page", "1"),
                    ("use-case", "browse"),
                ],
            )
            .await?;

        if result.data.is_empty() {
            return Err(ApiError::NoCards);
        }

        debug!(query, total = result.meta.total, returned = result.data.len(), "Card search done");
        Ok(result.data)
    }

    async fn get_card(&self, identifier: &str) -> Result<Card, ApiError> {
        let identifier = identifier.to_lowercase();
        self.client.get(&["cards", identifier.as_str()], &[]).await
    }
}
