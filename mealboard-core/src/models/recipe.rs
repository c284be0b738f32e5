use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, PlanResult};

pub type RecipeId = String;

pub const DEFAULT_SOURCE: &str = "local";

/// One measured ingredient line of a recipe.
///
/// Also reads a bare string such as `"1 cup oats"`, which older clients
/// saved. The whole string becomes the item, with no unit and quantity 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "IngredientRepr")]
pub struct Ingredient {
    pub item: String,
    pub unit: String,
    /// Amount needed for the owning recipe's `default_servings`.
    pub quantity: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IngredientRepr {
    Measured {
        item: String,
        #[serde(default)]
        unit: String,
        #[serde(default)]
        quantity: f64,
    },
    Line(String),
}

impl From<IngredientRepr> for Ingredient {
    fn from(repr: IngredientRepr) -> Self {
        match repr {
            IngredientRepr::Measured {
                item,
                unit,
                quantity,
            } => Self::new(item, unit, quantity),
            IngredientRepr::Line(line) => Self::new(line.trim(), "", 0.0),
        }
    }
}

impl Ingredient {
    pub fn new(item: impl Into<String>, unit: impl Into<String>, quantity: f64) -> Self {
        Self {
            item: item.into(),
            unit: unit.into(),
            quantity,
        }
    }
}

/// A recipe in the catalog.
///
/// The id is assigned on creation and never changes or gets reused. Documents
/// written before the `id` key existed used `uuid`, which is still accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(alias = "uuid")]
    pub id: RecipeId,
    pub title: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(rename = "isFavorite", default)]
    pub is_favorite: bool,
    #[serde(default = "default_source")]
    pub source: String,
    /// Servings the ingredient quantities are written for. Always at least 1
    /// for recipes created through the store.
    #[serde(default = "default_servings", alias = "defaultServings")]
    pub default_servings: u32,
}

fn default_source() -> String {
    DEFAULT_SOURCE.to_string()
}

fn default_servings() -> u32 {
    1
}

/// Input for creating a new recipe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateRecipeInput {
    pub title: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    pub tags: Option<BTreeSet<String>>,
    #[serde(rename = "isFavorite")]
    pub is_favorite: Option<bool>,
    /// Defaults to `"local"`.
    pub source: Option<String>,
    /// Clamped to at least 1.
    #[serde(alias = "defaultServings")]
    pub default_servings: Option<i64>,
}

impl CreateRecipeInput {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_ingredient(mut self, ingredient: Ingredient) -> Self {
        self.ingredients.push(ingredient);
        self
    }

    pub fn with_default_servings(mut self, servings: i64) -> Self {
        self.default_servings = Some(servings);
        self
    }

    pub fn favorite(mut self) -> Self {
        self.is_favorite = Some(true);
        self
    }

    /// Validates the draft and builds the record it describes under `id`.
    pub fn into_recipe(self, id: RecipeId) -> PlanResult<Recipe> {
        validate_title(&self.title)?;
        validate_ingredients(&self.ingredients)?;

        Ok(Recipe {
            id,
            title: self.title,
            ingredients: self.ingredients,
            tags: self.tags.unwrap_or_default(),
            is_favorite: self.is_favorite.unwrap_or(false),
            source: self.source.unwrap_or_else(default_source),
            default_servings: clamp_servings(self.default_servings.unwrap_or(1)),
        })
    }
}

/// Input for updating an existing recipe. All fields are optional for partial updates.
///
/// `id` may be echoed back by callers but must match the target recipe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRecipeInput {
    #[serde(alias = "uuid")]
    pub id: Option<RecipeId>,
    pub title: Option<String>,
    pub ingredients: Option<Vec<Ingredient>>,
    pub tags: Option<BTreeSet<String>>,
    #[serde(rename = "isFavorite")]
    pub is_favorite: Option<bool>,
    pub source: Option<String>,
    #[serde(alias = "defaultServings")]
    pub default_servings: Option<i64>,
}

impl UpdateRecipeInput {
    /// Merges the supplied fields over `recipe`.
    pub fn apply_to(self, recipe: &mut Recipe) -> PlanResult<()> {
        if let Some(id) = &self.id {
            if *id != recipe.id {
                return Err(PlanError::validation(format!(
                    "recipe id is immutable (got `{id}` for `{}`)",
                    recipe.id
                )));
            }
        }
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(ingredients) = &self.ingredients {
            validate_ingredients(ingredients)?;
        }
        if let Some(servings) = self.default_servings {
            if servings < 1 {
                return Err(PlanError::validation(
                    "default_servings must be at least 1",
                ));
            }
        }

        if let Some(title) = self.title {
            recipe.title = title;
        }
        if let Some(ingredients) = self.ingredients {
            recipe.ingredients = ingredients;
        }
        if let Some(tags) = self.tags {
            recipe.tags = tags;
        }
        if let Some(is_favorite) = self.is_favorite {
            recipe.is_favorite = is_favorite;
        }
        if let Some(source) = self.source {
            recipe.source = source;
        }
        if let Some(servings) = self.default_servings {
            recipe.default_servings = clamp_servings(servings);
        }
        Ok(())
    }
}

/// Display projection of a favorite recipe.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FavoriteSummary {
    pub title: String,
    pub id: RecipeId,
}

fn clamp_servings(servings: i64) -> u32 {
    servings.clamp(1, i64::from(u32::MAX)) as u32
}

fn validate_title(title: &str) -> PlanResult<()> {
    if title.trim().is_empty() {
        return Err(PlanError::validation("recipe title is required"));
    }
    Ok(())
}

fn validate_ingredients(ingredients: &[Ingredient]) -> PlanResult<()> {
    for ingredient in ingredients {
        if ingredient.item.trim().is_empty() {
            return Err(PlanError::validation("ingredient item is required"));
        }
        if !ingredient.quantity.is_finite() || ingredient.quantity < 0.0 {
            return Err(PlanError::validation(format!(
                "ingredient `{}` has invalid quantity {}",
                ingredient.item, ingredient.quantity
            )));
        }
    }
    Ok(())
}
