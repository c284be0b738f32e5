//! Favorites view over the recipe catalog.
//!
//! Derived on every call; recipes are keyed by id, so two favorites sharing a
//! title are still listed separately.

use crate::error::PlanResult;
use crate::models::{FavoriteSummary, Recipe};
use crate::recipes::RecipeStore;

#[derive(Clone)]
pub struct FavoritesIndex {
    recipes: RecipeStore,
}

impl FavoritesIndex {
    pub fn new(recipes: RecipeStore) -> Self {
        Self { recipes }
    }

    /// `(id, title)` of every favorite, sorted by title then id.
    pub fn list(&self) -> PlanResult<Vec<FavoriteSummary>> {
        let mut favorites: Vec<FavoriteSummary> = self
            .recipes
            .snapshot()?
            .into_values()
            .filter(|recipe| recipe.is_favorite)
            .map(|recipe| FavoriteSummary {
                title: recipe.title,
                id: recipe.id,
            })
            .collect();
        favorites.sort();
        Ok(favorites)
    }

    /// Full records of every favorite, in the same order as [`Self::list`].
    pub fn list_full(&self) -> PlanResult<Vec<Recipe>> {
        let mut favorites: Vec<Recipe> = self
            .recipes
            .snapshot()?
            .into_values()
            .filter(|recipe| recipe.is_favorite)
            .collect();
        favorites.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        Ok(favorites)
    }
}
