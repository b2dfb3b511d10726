//! Coordinates the shopping list and the menu book.
//!
//! Creating a menu, or asking for an existing menu's ingredients, runs the
//! ingredient import against the shopping list. Removing a menu never
//! touches the shopping list.

use tracing::info;
use uuid::Uuid;

use crate::error::PlannerError;
use crate::menu::{MenuBook, MenuDraft};
use crate::model::MenuItem;
use crate::shopping::{ImportOutcome, ShoppingList};

#[derive(Debug, Clone, Default)]
pub struct Planner {
    pub shopping: ShoppingList,
    pub menus: MenuBook,
}

impl Planner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_menu(&mut self, draft: &MenuDraft) -> Result<(MenuItem, ImportOutcome), PlannerError> {
        let menu = draft.build()?;
        self.menus.add(menu.clone());
        let outcome = self.shopping.import_ingredients(menu.ingredients.as_slice());
        info!(
            menu = %menu.name,
            imported = outcome.added_count(),
            "created menu"
        );
        Ok((menu, outcome))
    }

    pub fn import_menu_ingredients(&mut self, menu_id: Uuid) -> Result<ImportOutcome, PlannerError> {
        let ingredients = self
            .menus
            .get(menu_id)
            .map(|menu| menu.ingredients.clone())
            .ok_or(PlannerError::MenuNotFound(menu_id))?;
        Ok(self.shopping.import_ingredients(ingredients.as_slice()))
    }

    pub fn remove_menu(&mut self, menu_id: Uuid) -> Result<MenuItem, PlannerError> {
        self.menus.remove(menu_id)
    }
}
