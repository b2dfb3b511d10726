//! Conversational front-end over the planner.
//!
//! Every utterance is logged, routed through [`Command::parse`] and answered
//! locally when it is a store command. Anything else is handed back to the
//! caller as [`Turn::NeedsCompletion`] so it can go through the gateway,
//! usually on a background task.

use std::fmt::Write as _;
use tracing::debug;

use crate::command::{split_list, Command};
use crate::gateway::{AssistantGateway, AssistantProfile};
use crate::menu::MenuDraft;
use crate::model::{Category, MealType};
use crate::planner::Planner;
use crate::shopping::ImportOutcome;
use crate::state::{ChatMessage, ChatRole, PendingAction};

const HELP_TEXT: &str = "Puedo ayudarte con estas órdenes:
• añadir <ítem> [en frutas|verduras|carnes|lácteos|otros]
• quitar <ítem>
• marcar <ítem>
• lista
• menús
• crear menú <nombre> [para desayuno|comida|cena][: ingrediente, ingrediente…]
• ingredientes <menú>
Cualquier otra pregunta se la paso al asistente.";

/// What the caller has to do after a submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    /// A reply was appended to the transcript
    Answered,
    /// The utterance has to go to the chat-completion API
    NeedsCompletion(String),
}

#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// The pending action of the latest message, if it is an assistant one
    pub fn pending_action(&self) -> Option<&PendingAction> {
        self.messages
            .last()
            .filter(|m| m.role == ChatRole::Assistant)
            .and_then(|m| m.pending.as_ref())
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
    }

    pub fn submit(&mut self, planner: &mut Planner, input: &str) -> Turn {
        let input = input.trim();
        let pending = self.pending_action().cloned();
        self.messages.push(ChatMessage::user(input));

        if let Some(PendingAction::AwaitIngredients { menu_name, meal_type }) = pending {
            let reply = self.finish_menu(planner, &menu_name, meal_type, input);
            self.messages.push(reply);
            return Turn::Answered;
        }

        let command = Command::parse(input);
        debug!(?command, "routed utterance");

        let reply = match command {
            Command::Forward(text) => return Turn::NeedsCompletion(text),
            Command::Help => ChatMessage::assistant(HELP_TEXT),
            Command::ShowList => ChatMessage::assistant(describe_list(planner)),
            Command::ShowMenus => ChatMessage::assistant(describe_menus(planner)),
            Command::AddItem { name, category } => {
                ChatMessage::assistant(add_item(planner, &name, category.unwrap_or_default()))
            }
            Command::RemoveItem { name } => ChatMessage::assistant(remove_item(planner, &name)),
            Command::ToggleItem { name } => ChatMessage::assistant(toggle_item(planner, &name)),
            Command::ImportIngredients { menu } => {
                ChatMessage::assistant(import_ingredients(planner, &menu))
            }
            Command::CreateMenu {
                name,
                meal_type,
                ingredients,
            } => {
                let meal_type = meal_type.unwrap_or_default();
                if ingredients.is_empty() {
                    ChatMessage::assistant(format!(
                        "¿Qué ingredientes lleva «{name}»? Escríbelos separados por comas (o «cancelar»)."
                    ))
                    .with_pending(PendingAction::AwaitIngredients {
                        menu_name: name,
                        meal_type,
                    })
                } else {
                    ChatMessage::assistant(create_menu(planner, &name, meal_type, &ingredients))
                }
            }
        };

        self.messages.push(reply);
        Turn::Answered
    }

    /// Submit and, when needed, wait for the gateway reply in place
    pub async fn respond(
        &mut self,
        planner: &mut Planner,
        gateway: &AssistantGateway,
        profile: &AssistantProfile,
        input: &str,
    ) -> &ChatMessage {
        if let Turn::NeedsCompletion(text) = self.submit(planner, input) {
            let reply = gateway.generate_response(&text, profile).await;
            self.push_assistant(reply);
        }
        // submit always pushes at least the user message
        &self.messages[self.messages.len() - 1]
    }

    fn finish_menu(
        &self,
        planner: &mut Planner,
        menu_name: &str,
        meal_type: MealType,
        input: &str,
    ) -> ChatMessage {
        let answer = input
            .trim()
            .trim_start_matches('¡')
            .trim_end_matches(['.', '!', '?'])
            .trim();
        if answer.eq_ignore_ascii_case("cancelar") {
            return ChatMessage::assistant(format!("De acuerdo, he descartado el menú «{menu_name}»."));
        }

        let ingredients = split_list(input);
        if ingredients.is_empty() {
            return ChatMessage::assistant("Escribe al menos un ingrediente, o «cancelar».")
                .with_pending(PendingAction::AwaitIngredients {
                    menu_name: menu_name.to_string(),
                    meal_type,
                });
        }

        ChatMessage::assistant(create_menu(planner, menu_name, meal_type, &ingredients))
    }
}

fn add_item(planner: &mut Planner, name: &str, category: Category) -> String {
    match planner.shopping.add(name, category) {
        Ok(item) => format!(
            "He añadido «{}» a tu lista de compras ({}).",
            item.name,
            item.category.label()
        ),
        Err(e) => e.to_string(),
    }
}

fn remove_item(planner: &mut Planner, name: &str) -> String {
    let Some(id) = planner.shopping.find_by_name(name).map(|item| item.id) else {
        return format!("No encuentro «{name}» en tu lista de compras.");
    };
    match planner.shopping.remove(id) {
        Ok(item) => format!("He quitado «{}» de tu lista.", item.name),
        Err(e) => e.to_string(),
    }
}

fn toggle_item(planner: &mut Planner, name: &str) -> String {
    let Some(item) = planner.shopping.find_by_name(name) else {
        return format!("No encuentro «{name}» en tu lista de compras.");
    };
    let (id, item_name) = (item.id, item.name.clone());
    match planner.shopping.toggle(id) {
        Ok(true) => format!("✓ «{item_name}» marcado como comprado."),
        Ok(false) => format!("«{item_name}» vuelve a estar pendiente."),
        Err(e) => e.to_string(),
    }
}

fn create_menu(planner: &mut Planner, name: &str, meal_type: MealType, ingredients: &[String]) -> String {
    let draft = MenuDraft::new(name, meal_type).with_ingredients(ingredients);
    match planner.create_menu(&draft) {
        Ok((menu, outcome)) => {
            let mut reply = format!(
                "Menú «{}» ({}) añadido a tus menús.",
                menu.name,
                menu.meal_type.label()
            );
            if !outcome.is_empty() {
                let _ = write!(reply, " {}", describe_import(&outcome));
            }
            reply
        }
        Err(e) => e.to_string(),
    }
}

fn import_ingredients(planner: &mut Planner, menu_name: &str) -> String {
    let Some(menu) = planner.menus.find_by_name(menu_name) else {
        return format!("No encuentro el menú «{menu_name}».");
    };
    let (id, name) = (menu.id, menu.name.clone());
    match planner.import_menu_ingredients(id) {
        Ok(outcome) if outcome.is_empty() => {
            "Todos los ingredientes ya están en tu lista de compras.".to_string()
        }
        Ok(outcome) => format!(
            "{} ingredientes de {} añadidos a tu lista: {}.",
            outcome.added_count(),
            name,
            added_names(&outcome)
        ),
        Err(e) => e.to_string(),
    }
}

fn describe_import(outcome: &ImportOutcome) -> String {
    format!(
        "{} ingredientes nuevos se han añadido a tu lista: {}.",
        outcome.added_count(),
        added_names(outcome)
    )
}

fn added_names(outcome: &ImportOutcome) -> String {
    outcome
        .added
        .iter()
        .map(|item| item.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_list(planner: &Planner) -> String {
    let items = planner.shopping.items();
    if items.is_empty() {
        return "Tu lista está vacía. Añade algunos ítems.".to_string();
    }

    let mut out = String::from("Tu lista de compras:\n");
    for (i, item) in items.iter().enumerate() {
        let mark = if item.checked { "x" } else { " " };
        let _ = writeln!(out, "{}. [{}] {} ({})", i + 1, mark, item.name, item.category.label());
    }
    let _ = write!(out, "Te quedan {} ítems por comprar.", planner.shopping.pending_count());
    out
}

fn describe_menus(planner: &Planner) -> String {
    let menus = planner.menus.menus();
    if menus.is_empty() {
        return "No has creado ningún menú todavía.".to_string();
    }

    let mut out = String::from("Tus menús semanales:\n");
    for menu in menus {
        let _ = writeln!(
            out,
            "• {} ({}): {}",
            menu.name,
            menu.meal_type.label(),
            menu.ingredients.join(", ")
        );
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn last_reply(conversation: &Conversation) -> &str {
        &conversation.last().unwrap().content
    }

    #[test]
    fn test_add_then_toggle_reflected_in_reply() {
        let mut planner = Planner::new();
        let mut chat = Conversation::new();

        assert_eq!(chat.submit(&mut planner, "añade leche en lácteos"), Turn::Answered);
        assert_eq!(planner.shopping.items()[0].category, Category::Dairy);

        chat.submit(&mut planner, "marca leche");
        assert!(planner.shopping.items()[0].checked);
        assert_eq!(last_reply(&chat), "✓ «leche» marcado como comprado.");

        chat.submit(&mut planner, "desmarca LECHE");
        assert!(!planner.shopping.items()[0].checked);
        assert_eq!(last_reply(&chat), "«leche» vuelve a estar pendiente.");
        assert_eq!(chat.messages().len(), 6);
    }

    #[test]
    fn test_remove_unknown_item() {
        let mut planner = Planner::new();
        let mut chat = Conversation::new();
        chat.submit(&mut planner, "quitar caviar");
        assert_eq!(last_reply(&chat), "No encuentro «caviar» en tu lista de compras.");
    }

    #[test]
    fn test_forward_leaves_only_user_message() {
        let mut planner = Planner::new();
        let mut chat = Conversation::new();
        let turn = chat.submit(&mut planner, "¿Qué ceno hoy?");
        assert_eq!(turn, Turn::NeedsCompletion("¿Qué ceno hoy?".to_string()));
        assert_eq!(chat.messages().len(), 1);
        assert_eq!(chat.messages()[0].role, ChatRole::User);
    }

    #[test]
    fn test_menu_with_pending_ingredients() {
        let mut planner = Planner::new();
        planner.shopping.add("huevos", Category::Other).unwrap();
        let mut chat = Conversation::new();

        chat.submit(&mut planner, "crear menú tortilla para cena");
        assert_eq!(
            chat.pending_action(),
            Some(&PendingAction::AwaitIngredients {
                menu_name: "tortilla".to_string(),
                meal_type: MealType::Dinner,
            })
        );
        assert!(planner.menus.is_empty());

        chat.submit(&mut planner, "Huevos, patatas y cebolla");
        assert!(chat.pending_action().is_none());
        assert_eq!(planner.menus.len(), 1);
        let names: Vec<&str> = planner.shopping.items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["huevos", "patatas", "cebolla"]);
        assert!(last_reply(&chat).contains("2 ingredientes nuevos"));
    }

    #[test]
    fn test_pending_menu_can_be_cancelled() {
        let mut planner = Planner::new();
        let mut chat = Conversation::new();
        chat.submit(&mut planner, "nuevo menú lentejas");
        chat.submit(&mut planner, "cancelar");
        assert!(planner.menus.is_empty());
        assert!(chat.pending_action().is_none());
    }

    #[test]
    fn test_punctuated_cancel_creates_nothing() {
        for answer in ["Cancelar.", "¡cancelar!", "  CANCELAR  "] {
            let mut planner = Planner::new();
            let mut chat = Conversation::new();
            chat.submit(&mut planner, "nuevo menú lentejas");
            chat.submit(&mut planner, answer);
            assert!(planner.menus.is_empty(), "{answer}");
            assert!(planner.shopping.is_empty(), "{answer}");
            assert!(chat.pending_action().is_none());
            assert!(last_reply(&chat).contains("descartado"));
        }
    }

    #[test]
    fn test_import_for_existing_menu() {
        let mut planner = Planner::new();
        let mut chat = Conversation::new();
        chat.submit(&mut planner, "crear menú gazpacho: tomate, pepino");
        assert_eq!(planner.shopping.len(), 2);

        chat.submit(&mut planner, "ingredientes gazpacho");
        assert_eq!(
            last_reply(&chat),
            "Todos los ingredientes ya están en tu lista de compras."
        );

        chat.submit(&mut planner, "ingredientes paella");
        assert_eq!(last_reply(&chat), "No encuentro el menú «paella».");
    }

    #[test]
    fn test_show_list_summary() {
        let mut planner = Planner::new();
        let mut chat = Conversation::new();
        chat.submit(&mut planner, "lista");
        assert_eq!(last_reply(&chat), "Tu lista está vacía. Añade algunos ítems.");

        chat.submit(&mut planner, "añadir pan");
        chat.submit(&mut planner, "lista");
        assert!(last_reply(&chat).contains("1. [ ] pan (otros)"));
        assert!(last_reply(&chat).ends_with("Te quedan 1 ítems por comprar."));
    }
}
