//! Concert lookup gated on publish state.

use common::ConcertId;
use store::{Concert, NewConcert, Store, Visibility};

use crate::error::DomainError;

/// Service for browsing and creating concerts.
///
/// Public lookups only ever see published concerts. An unpublished concert
/// is reported exactly like a missing one so its existence does not leak.
#[derive(Clone)]
pub struct ConcertCatalog<S: Store> {
    store: S,
}

impl<S: Store> ConcertCatalog<S> {
    /// Creates a new catalog over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists every published concert.
    #[tracing::instrument(skip(self))]
    pub async fn find_published(&self) -> Result<Vec<Concert>, DomainError> {
        Ok(self.store.list_concerts(Visibility::Published).await?)
    }

    /// Loads a published concert.
    #[tracing::instrument(skip(self))]
    pub async fn find_published_by_id(&self, id: ConcertId) -> Result<Concert, DomainError> {
        self.store
            .get_concert(id, Visibility::Published)
            .await?
            .ok_or(DomainError::ConcertNotFound(id))
    }

    /// Lists every concert, including unpublished ones.
    #[tracing::instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<Concert>, DomainError> {
        Ok(self.store.list_concerts(Visibility::All).await?)
    }

    /// Loads a concert regardless of publish state.
    #[tracing::instrument(skip(self))]
    pub async fn find_by_id(&self, id: ConcertId) -> Result<Concert, DomainError> {
        self.store
            .get_concert(id, Visibility::All)
            .await?
            .ok_or(DomainError::ConcertNotFound(id))
    }

    /// Inserts a new concert.
    #[tracing::instrument(skip(self, concert), fields(title = %concert.title))]
    pub async fn create(&self, concert: NewConcert) -> Result<Concert, DomainError> {
        if concert.ticket_price.is_negative() {
            return Err(DomainError::InvalidOrder(format!(
                "ticket price cannot be negative: {}",
                concert.ticket_price
            )));
        }

        let concert = self.store.insert_concert(concert).await?;
        tracing::info!(concert_id = %concert.id, published = concert.is_published(), "concert created");
        Ok(concert)
    }
}
