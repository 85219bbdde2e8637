use std::sync::Arc;

use crate::{error::AppResult, models::Favorite, store::DocumentStore};

/// Favorite toggling and listing.
///
/// Favorites are a per-user set keyed by show id; adding and removing are
/// both idempotent.
#[derive(Clone)]
pub struct FavoriteService {
    store: Arc<dyn DocumentStore>,
}

impl FavoriteService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Adds a show to the user's favorites. Re-adding refreshes the poster.
    pub async fn add_favorite(
        &self,
        user_id: &str,
        show_id: &str,
        poster_path: Option<String>,
    ) -> AppResult<()> {
        self.store
            .add_favorite(
                user_id,
                Favorite {
                    show_id: show_id.to_string(),
                    poster_path,
                },
            )
            .await?;
        tracing::debug!(user_id = %user_id, show_id = %show_id, "favorite added");
        Ok(())
    }

    /// Removes a show from the user's favorites.
    pub async fn remove_favorite(&self, user_id: &str, show_id: &str) -> AppResult<()> {
        self.store.remove_favorite(user_id, show_id).await?;
        tracing::debug!(user_id = %user_id, show_id = %show_id, "favorite removed");
        Ok(())
    }

    /// All of the user's favorites, oldest first.
    pub async fn favorites(&self, user_id: &str) -> AppResult<Vec<Favorite>> {
        self.store.list_favorites(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> FavoriteService {
        FavoriteService::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_add_list_remove() {
        let favorites = service();

        favorites
            .add_favorite("u1", "s1", Some("/a.jpg".to_string()))
            .await
            .unwrap();
        favorites.add_favorite("u1", "s2", None).await.unwrap();

        let listed = favorites.favorites("u1").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].show_id, "s1");

        favorites.remove_favorite("u1", "s1").await.unwrap();
        let listed = favorites.favorites("u1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].show_id, "s2");
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let favorites = service();

        favorites.add_favorite("u1", "s1", None).await.unwrap();
        favorites
            .add_favorite("u1", "s1", Some("/late.jpg".to_string()))
            .await
            .unwrap();

        let listed = favorites.favorites("u1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].poster_path, Some("/late.jpg".to_string()));
    }

    #[tokio::test]
    async fn test_remove_missing_is_noop() {
        let favorites = service();
        favorites.remove_favorite("u1", "never-added").await.unwrap();
        assert!(favorites.favorites("u1").await.unwrap().is_empty());
    }
}
