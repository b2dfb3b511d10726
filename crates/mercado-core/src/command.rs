//! Recognized assistant commands.
//!
//! Each command is one anchored, case-insensitive pattern. Input that
//! matches none of them is forwarded to the chat-completion API.

use regex::Regex;
use std::sync::LazyLock;

use crate::model::{Category, MealType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddItem {
        name: String,
        category: Option<Category>,
    },
    RemoveItem {
        name: String,
    },
    ToggleItem {
        name: String,
    },
    ShowList,
    ShowMenus,
    CreateMenu {
        name: String,
        meal_type: Option<MealType>,
        ingredients: Vec<String>,
    },
    ImportIngredients {
        menu: String,
    },
    Help,
    Forward(String),
}

static HELP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:ayuda|help|\?)$").expect("valid regex"));

static LIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?:ver|mostrar|muestra|muéstrame)\s+(?:la\s+|mi\s+)?)?lista(?:\s+de\s+(?:la\s+)?compras?)?$")
        .expect("valid regex")
});

static MENUS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?:ver|mostrar|muestra|muéstrame)\s+(?:los\s+|mis\s+)?)?men[uú]s$")
        .expect("valid regex")
});

static CREATE_MENU_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:crear?|nuevo)\s+men[uú]\s+(.+?)(?:\s+(?:de|para)\s+(?:el\s+|la\s+)?(desayuno|comida|almuerzo|cena))?(?:\s*:\s*(.*))?$")
        .expect("valid regex")
});

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?:añadir|añade|agregar|agrega)\s+)?ingredientes\s+(?:(?:de|del)\s+)?(?:men[uú]\s+)?(.+)$")
        .expect("valid regex")
});

static ADD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:añadir|añade|agregar|agrega|apunta|apuntar)\s+(.+?)(?:\s+(?:en|a)\s+(?:la\s+lista\s+(?:de\s+)?)?(frutas?|verduras?|carnes?|l[aá]cteos?|otros?))?(?:\s+a\s+la\s+lista)?$")
        .expect("valid regex")
});

static REMOVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:quitar|quita|eliminar|elimina|borrar|borra)\s+(.+?)(?:\s+de\s+la\s+lista)?$")
        .expect("valid regex")
});

static TOGGLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:marcar|marca|desmarcar|desmarca)\s+(.+?)(?:\s+como\s+comprad[oa]s?)?$")
        .expect("valid regex")
});

static LIST_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*,\s*|\s+y\s+").expect("valid regex"));

impl Command {
    pub fn parse(input: &str) -> Command {
        let text = input.trim();
        if HELP_RE.is_match(text) {
            return Command::Help;
        }

        let text = text.trim_end_matches(['.', '!', '?']).trim();

        if LIST_RE.is_match(text) {
            return Command::ShowList;
        }
        if MENUS_RE.is_match(text) {
            return Command::ShowMenus;
        }
        if let Some(caps) = CREATE_MENU_RE.captures(text) {
            return Command::CreateMenu {
                name: caps[1].trim().to_string(),
                meal_type: caps.get(2).and_then(|m| MealType::from_str(m.as_str())),
                ingredients: caps
                    .get(3)
                    .map(|m| split_list(m.as_str()))
                    .unwrap_or_default(),
            };
        }
        if let Some(caps) = IMPORT_RE.captures(text) {
            return Command::ImportIngredients {
                menu: caps[1].trim().to_string(),
            };
        }
        if let Some(caps) = ADD_RE.captures(text) {
            return Command::AddItem {
                name: caps[1].trim().to_string(),
                category: caps.get(2).and_then(|m| Category::from_str(m.as_str())),
            };
        }
        if let Some(caps) = REMOVE_RE.captures(text) {
            return Command::RemoveItem {
                name: caps[1].trim().to_string(),
            };
        }
        if let Some(caps) = TOGGLE_RE.captures(text) {
            return Command::ToggleItem {
                name: caps[1].trim().to_string(),
            };
        }

        Command::Forward(input.trim().to_string())
    }
}

/// Split "huevos, patatas y cebolla" into its parts
pub fn split_list(text: &str) -> Vec<String> {
    LIST_SEPARATOR_RE
        .split(text.trim().trim_end_matches('.'))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_item_with_and_without_category() {
        assert_eq!(
            Command::parse("Añade leche en lácteos"),
            Command::AddItem {
                name: "leche".to_string(),
                category: Some(Category::Dairy)
            }
        );
        assert_eq!(
            Command::parse("agregar pan integral a la lista"),
            Command::AddItem {
                name: "pan integral".to_string(),
                category: None
            }
        );
    }

    #[test]
    fn test_remove_and_toggle() {
        assert_eq!(
            Command::parse("quita los tomates de la lista"),
            Command::RemoveItem {
                name: "los tomates".to_string()
            }
        );
        assert_eq!(
            Command::parse("marcar leche como comprada"),
            Command::ToggleItem {
                name: "leche".to_string()
            }
        );
        assert_eq!(
            Command::parse("desmarca pan"),
            Command::ToggleItem {
                name: "pan".to_string()
            }
        );
    }

    #[test]
    fn test_show_commands() {
        assert_eq!(Command::parse("lista"), Command::ShowList);
        assert_eq!(Command::parse("Ver la lista de la compra"), Command::ShowList);
        assert_eq!(Command::parse("menús"), Command::ShowMenus);
        assert_eq!(Command::parse("mostrar menus"), Command::ShowMenus);
        assert_eq!(Command::parse("ayuda"), Command::Help);
    }

    #[test]
    fn test_create_menu_full_form() {
        assert_eq!(
            Command::parse("crear menú tortilla para cena: huevos, patatas y cebolla"),
            Command::CreateMenu {
                name: "tortilla".to_string(),
                meal_type: Some(MealType::Dinner),
                ingredients: vec![
                    "huevos".to_string(),
                    "patatas".to_string(),
                    "cebolla".to_string()
                ],
            }
        );
    }

    #[test]
    fn test_create_menu_without_ingredients() {
        assert_eq!(
            Command::parse("nuevo menu lentejas"),
            Command::CreateMenu {
                name: "lentejas".to_string(),
                meal_type: None,
                ingredients: Vec::new(),
            }
        );
    }

    #[test]
    fn test_import_before_add() {
        assert_eq!(
            Command::parse("añadir ingredientes del menú paella"),
            Command::ImportIngredients {
                menu: "paella".to_string()
            }
        );
        assert_eq!(
            Command::parse("ingredientes tortilla"),
            Command::ImportIngredients {
                menu: "tortilla".to_string()
            }
        );
    }

    #[test]
    fn test_unrecognized_is_forwarded() {
        assert_eq!(
            Command::parse("  ¿Qué puedo cenar con pollo?  "),
            Command::Forward("¿Qué puedo cenar con pollo?".to_string())
        );
        // a bare keyword without an argument is not a command
        assert_eq!(Command::parse("añadir"), Command::Forward("añadir".to_string()));
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("arroz,  gambas y  azafrán."), vec!["arroz", "gambas", "azafrán"]);
        assert!(split_list(" , ").is_empty());
    }
}
