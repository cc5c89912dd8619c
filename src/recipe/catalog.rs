//! Recipes known to the engine.

use std::collections::BTreeMap;

use super::builder::Recipe;

/// Recipes the resolver can expand transitively, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct RecipeCatalog {
    recipes: BTreeMap<String, Recipe>,
}

impl RecipeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a recipe, returning any recipe it replaced.
    pub fn insert(&mut self, recipe: Recipe) -> Option<Recipe> {
        self.recipes.insert(recipe.name().to_string(), recipe)
    }

    pub fn get(&self, name: &str) -> Option<&Recipe> {
        self.recipes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.recipes.contains_key(name)
    }

    /// Recipe names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.recipes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.values()
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

impl FromIterator<Recipe> for RecipeCatalog {
    fn from_iter<I: IntoIterator<Item = Recipe>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for recipe in iter {
            catalog.insert(recipe);
        }
        catalog
    }
}
