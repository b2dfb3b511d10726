//! Plain data types for the shopping list and the weekly menus.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Fruit,
    Vegetable,
    Meat,
    Dairy,
    #[default]
    Other,
}

impl Category {
    pub fn all() -> Vec<Category> {
        vec![
            Category::Fruit,
            Category::Vegetable,
            Category::Meat,
            Category::Dairy,
            Category::Other,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Fruit => "frutas",
            Category::Vegetable => "verduras",
            Category::Meat => "carnes",
            Category::Dairy => "lácteos",
            Category::Other => "otros",
        }
    }

    /// Accepts the Spanish labels (with or without accent, singular or
    /// plural) and the English variant names.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "frutas" | "fruta" | "fruit" => Some(Category::Fruit),
            "verduras" | "verdura" | "vegetable" => Some(Category::Vegetable),
            "carnes" | "carne" | "meat" => Some(Category::Meat),
            "lácteos" | "lacteos" | "lácteo" | "lacteo" | "dairy" => Some(Category::Dairy),
            "otros" | "otro" | "other" => Some(Category::Other),
            _ => None,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Category::Fruit => Category::Vegetable,
            Category::Vegetable => Category::Meat,
            Category::Meat => Category::Dairy,
            Category::Dairy => Category::Other,
            Category::Other => Category::Fruit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    #[default]
    Lunch,
    Dinner,
}

impl MealType {
    pub fn all() -> Vec<MealType> {
        vec![MealType::Breakfast, MealType::Lunch, MealType::Dinner]
    }

    pub fn label(&self) -> &'static str {
        match self {
            MealType::Breakfast => "desayuno",
            MealType::Lunch => "comida",
            MealType::Dinner => "cena",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "desayuno" | "breakfast" => Some(MealType::Breakfast),
            "comida" | "almuerzo" | "lunch" => Some(MealType::Lunch),
            "cena" | "dinner" => Some(MealType::Dinner),
            _ => None,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            MealType::Breakfast => MealType::Lunch,
            MealType::Lunch => MealType::Dinner,
            MealType::Dinner => MealType::Breakfast,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub id: Uuid,
    pub name: String,
    pub checked: bool,
    pub category: Category,
}

impl ShoppingItem {
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            checked: false,
            category,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub meal_type: MealType,
    pub ingredients: Vec<String>,
}

/// Which slice of the shopping list to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(&self, item: &ShoppingItem) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => item.category == *category,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CategoryFilter::All => "todos",
            CategoryFilter::Only(category) => category.label(),
        }
    }

    /// Cycles todos → frutas → … → otros → todos
    pub fn next(&self) -> Self {
        match self {
            CategoryFilter::All => CategoryFilter::Only(Category::Fruit),
            CategoryFilter::Only(Category::Other) => CategoryFilter::All,
            CategoryFilter::Only(category) => CategoryFilter::Only(category.next()),
        }
    }
}
