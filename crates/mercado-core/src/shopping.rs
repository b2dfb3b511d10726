use tracing::debug;
use uuid::Uuid;

use crate::error::PlannerError;
use crate::model::{Category, CategoryFilter, ShoppingItem};

/// Result of importing a batch of ingredient names into the shopping list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Items appended to the list, in input order
    pub added: Vec<ShoppingItem>,
    /// Candidates that were already on the list
    pub skipped: Vec<String>,
}

impl ImportOutcome {
    pub fn added_count(&self) -> usize {
        self.added.len()
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
    }
}

/// Ordered, checkable shopping list.
///
/// Names are not required to be unique; only ingredient imports dedup.
#[derive(Debug, Clone, Default)]
pub struct ShoppingList {
    items: Vec<ShoppingItem>,
}

impl ShoppingList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[ShoppingItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&ShoppingItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn add(&mut self, name: &str, category: Category) -> Result<ShoppingItem, PlannerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PlannerError::EmptyItemName);
        }

        let item = ShoppingItem::new(name, category);
        debug!(id = %item.id, name, category = category.label(), "added shopping item");
        self.items.push(item.clone());
        Ok(item)
    }

    pub fn remove(&mut self, id: Uuid) -> Result<ShoppingItem, PlannerError> {
        let idx = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(PlannerError::ItemNotFound(id))?;
        let removed = self.items.remove(idx);
        debug!(id = %removed.id, name = %removed.name, "removed shopping item");
        Ok(removed)
    }

    /// Flip the checked flag, returning the new value
    pub fn toggle(&mut self, id: Uuid) -> Result<bool, PlannerError> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(PlannerError::ItemNotFound(id))?;
        item.checked = !item.checked;
        debug!(id = %item.id, checked = item.checked, "toggled shopping item");
        Ok(item.checked)
    }

    pub fn filtered(&self, filter: CategoryFilter) -> Vec<&ShoppingItem> {
        self.items.iter().filter(|item| filter.matches(item)).collect()
    }

    /// First item whose name matches case-insensitively
    pub fn find_by_name(&self, name: &str) -> Option<&ShoppingItem> {
        let needle = name.trim().to_lowercase();
        self.items.iter().find(|item| item.name.to_lowercase() == needle)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.find_by_name(name).is_some()
    }

    pub fn pending_count(&self) -> usize {
        self.items.iter().filter(|item| !item.checked).count()
    }

    /// Append every candidate whose lowercase form matches no existing
    /// item name. New items are unchecked and filed under `Category::Other`.
    ///
    /// Candidates are compared against the list as it was before the call,
    /// so a batch containing the same new name twice adds it twice.
    pub fn import_ingredients<S: AsRef<str>>(&mut self, candidates: &[S]) -> ImportOutcome {
        let existing: Vec<String> = self.items.iter().map(|item| item.name.to_lowercase()).collect();

        let mut outcome = ImportOutcome::default();
        for candidate in candidates {
            let candidate = candidate.as_ref();
            if existing.contains(&candidate.to_lowercase()) {
                outcome.skipped.push(candidate.to_string());
            } else {
                outcome.added.push(ShoppingItem::new(candidate, Category::Other));
            }
        }

        self.items.extend(outcome.added.iter().cloned());
        debug!(
            added = outcome.added.len(),
            skipped = outcome.skipped.len(),
            "imported ingredients"
        );
        outcome
    }
}
