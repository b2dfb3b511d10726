use tracing::debug;
use uuid::Uuid;

use crate::error::PlannerError;
use crate::model::{MealType, MenuItem};

/// A menu being composed before it is added to the book
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuDraft {
    pub name: String,
    pub meal_type: MealType,
    pub ingredients: Vec<String>,
}

impl MenuDraft {
    pub fn new(name: impl Into<String>, meal_type: MealType) -> Self {
        Self {
            name: name.into(),
            meal_type,
            ingredients: Vec::new(),
        }
    }

    pub fn with_ingredients<S: AsRef<str>>(mut self, ingredients: &[S]) -> Self {
        for ingredient in ingredients {
            self.add_ingredient(ingredient.as_ref());
        }
        self
    }

    /// Blank input is ignored; returns whether something was added
    pub fn add_ingredient(&mut self, ingredient: &str) -> bool {
        let ingredient = ingredient.trim();
        if ingredient.is_empty() {
            return false;
        }
        self.ingredients.push(ingredient.to_string());
        true
    }

    /// Drops every entry equal to `ingredient`
    pub fn remove_ingredient(&mut self, ingredient: &str) {
        self.ingredients.retain(|i| i != ingredient);
    }

    pub fn build(&self) -> Result<MenuItem, PlannerError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(PlannerError::EmptyMenuName);
        }
        if self.ingredients.is_empty() {
            return Err(PlannerError::NoIngredients);
        }

        Ok(MenuItem {
            id: Uuid::new_v4(),
            name: name.to_string(),
            meal_type: self.meal_type,
            ingredients: self.ingredients.clone(),
        })
    }

    pub fn clear(&mut self) {
        self.name.clear();
        self.ingredients.clear();
    }
}

/// Ordered collection of weekly menus, with at most one expanded at a time
#[derive(Debug, Clone, Default)]
pub struct MenuBook {
    menus: Vec<MenuItem>,
    expanded: Option<Uuid>,
}

impl MenuBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn menus(&self) -> &[MenuItem] {
        &self.menus
    }

    pub fn len(&self) -> usize {
        self.menus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.menus.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&MenuItem> {
        self.menus.iter().find(|menu| menu.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&MenuItem> {
        let needle = name.trim().to_lowercase();
        self.menus.iter().find(|menu| menu.name.to_lowercase() == needle)
    }

    pub fn add(&mut self, menu: MenuItem) {
        debug!(id = %menu.id, name = %menu.name, meal = menu.meal_type.label(), "added menu");
        self.menus.push(menu);
    }

    /// Removes the menu only; shopping items it imported stay put
    pub fn remove(&mut self, id: Uuid) -> Result<MenuItem, PlannerError> {
        let idx = self
            .menus
            .iter()
            .position(|menu| menu.id == id)
            .ok_or(PlannerError::MenuNotFound(id))?;
        if self.expanded == Some(id) {
            self.expanded = None;
        }
        let removed = self.menus.remove(idx);
        debug!(id = %removed.id, name = %removed.name, "removed menu");
        Ok(removed)
    }

    pub fn expanded(&self) -> Option<Uuid> {
        self.expanded
    }

    pub fn is_expanded(&self, id: Uuid) -> bool {
        self.expanded == Some(id)
    }

    /// Expand `id`, or collapse it if it is already the expanded one
    pub fn toggle_expanded(&mut self, id: Uuid) {
        self.expanded = if self.expanded == Some(id) { None } else { Some(id) };
    }
}
