//! Recipe catalog.
//!
//! # Invariants
//! - Ids are assigned here, never change, and are never reused after delete.
//! - Every write path validates before the document is touched.
//! - Deleting a recipe leaves meal slots that reference it alone.

use std::collections::BTreeMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::db::{Document, DocumentBackend, RECIPES_DOCUMENT};
use crate::error::{PlanError, PlanResult};
use crate::models::{CreateRecipeInput, Recipe, RecipeId, UpdateRecipeInput};

/// The persisted recipes document: `id -> Recipe`.
pub type RecipeBook = BTreeMap<RecipeId, Recipe>;

#[derive(Clone)]
pub struct RecipeStore {
    document: Document<RecipeBook>,
}

impl RecipeStore {
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self {
            document: Document::new(RECIPES_DOCUMENT, backend),
        }
    }

    pub fn create(&self, input: CreateRecipeInput) -> PlanResult<Recipe> {
        let recipe = input.into_recipe(Uuid::new_v4().to_string())?;

        self.document.update(|book| {
            if book.contains_key(&recipe.id) {
                return Err(PlanError::validation(format!(
                    "recipe id {} already exists",
                    recipe.id
                )));
            }
            book.insert(recipe.id.clone(), recipe.clone());
            Ok(())
        })?;

        tracing::debug!(recipe_id = %recipe.id, title = %recipe.title, "Created recipe");
        Ok(recipe)
    }

    pub fn find(&self, id: &str) -> PlanResult<Option<Recipe>> {
        Ok(self.document.read()?.remove(id))
    }

    pub fn get(&self, id: &str) -> PlanResult<Recipe> {
        self.find(id)?
            .ok_or_else(|| PlanError::recipe_not_found(id))
    }

    /// Merges `input` over the stored recipe and returns the result.
    pub fn update(&self, id: &str, input: UpdateRecipeInput) -> PlanResult<Recipe> {
        let recipe = self.document.update(|book| {
            let recipe = book
                .get_mut(id)
                .ok_or_else(|| PlanError::recipe_not_found(id))?;
            input.apply_to(recipe)?;
            Ok::<_, PlanError>(recipe.clone())
        })?;

        tracing::debug!(recipe_id = %id, "Updated recipe");
        Ok(recipe)
    }

    /// Removes a recipe. Returns `false` when there was nothing to remove.
    pub fn delete(&self, id: &str) -> PlanResult<bool> {
        let removed = self
            .document
            .update(|book| Ok::<_, PlanError>(book.remove(id).is_some()))?;

        if removed {
            tracing::debug!(recipe_id = %id, "Deleted recipe");
        }
        Ok(removed)
    }

    /// All recipes, ordered by title then id.
    pub fn list(&self) -> PlanResult<Vec<Recipe>> {
        let mut recipes: Vec<Recipe> = self.document.read()?.into_values().collect();
        recipes.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        Ok(recipes)
    }

    /// The whole catalog as one consistent snapshot.
    pub fn snapshot(&self) -> PlanResult<RecipeBook> {
        Ok(self.document.read()?)
    }
}
