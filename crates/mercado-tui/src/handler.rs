use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crate::app::{App, InputMode, MenuField, Popup, Screen};
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(),
    }
    app.poll_chat_task().await;
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if let Some(popup) = app.popup {
        match popup {
            Popup::ApiKey => handle_api_key_popup(app, key),
            Popup::ProviderPicker => handle_provider_picker(app, key),
            Popup::SystemPrompt => handle_prompt_popup(app, key),
            Popup::MenuForm => handle_menu_form(app, key),
        }
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    // Keys shared by every screen
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            return;
        }
        KeyCode::Tab => {
            app.screen = app.screen.next();
            return;
        }
        KeyCode::Char('1') => {
            app.screen = Screen::Shopping;
            return;
        }
        KeyCode::Char('2') => {
            app.screen = Screen::Menus;
            return;
        }
        KeyCode::Char('3') => {
            app.screen = Screen::Assistant;
            return;
        }
        KeyCode::Char('K') => {
            app.open_api_key_input(app.settings.provider());
            return;
        }
        KeyCode::Char('P') => {
            app.open_provider_picker();
            return;
        }
        KeyCode::Char('S') => {
            app.open_prompt_editor();
            return;
        }
        _ => {}
    }

    match app.screen {
        Screen::Shopping => handle_shopping_normal(app, key),
        Screen::Menus => handle_menus_normal(app, key),
        Screen::Assistant => handle_assistant_normal(app, key),
    }
}

fn handle_shopping_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.items_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.items_nav_up(),
        KeyCode::Char(' ') | KeyCode::Enter => app.toggle_selected_item(),
        KeyCode::Char('d') | KeyCode::Delete => app.remove_selected_item(),
        KeyCode::Char('c') => app.cycle_new_item_category(),
        KeyCode::Char('f') => app.cycle_filter(),
        KeyCode::Char('a') | KeyCode::Char('i') => app.input_mode = InputMode::Editing,
        _ => {}
    }
}

fn handle_menus_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.menus_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.menus_nav_up(),
        KeyCode::Char(' ') | KeyCode::Enter => app.toggle_selected_menu_expanded(),
        KeyCode::Char('i') => app.import_selected_menu(),
        KeyCode::Char('d') | KeyCode::Delete => app.remove_selected_menu(),
        KeyCode::Char('n') | KeyCode::Char('a') => app.open_menu_form(),
        _ => {}
    }
}

fn handle_assistant_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.chat_scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.chat_scroll_up(),
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),
        KeyCode::Char('i') | KeyCode::Char('a') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
        }
        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match app.screen {
        Screen::Shopping => handle_shopping_editing(app, key),
        Screen::Assistant => handle_assistant_editing(app, key),
        Screen::Menus => app.input_mode = InputMode::Normal,
    }
}

fn handle_shopping_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Enter => app.add_item_from_input(),
        KeyCode::Tab => app.cycle_new_item_category(),
        _ => edit_text(&mut app.item_input, key),
    }
}

fn handle_assistant_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        // Submission is blocked while a reply is in flight
        KeyCode::Enter => app.submit_chat(),
        _ => edit_text(&mut app.chat_input, key),
    }
}

fn handle_menu_form(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.submit_menu_form();
        return;
    }

    match key.code {
        KeyCode::Esc => app.popup = None,
        KeyCode::Tab => app.menu_field = app.menu_field.next(),
        _ => match app.menu_field {
            MenuField::Name => match key.code {
                KeyCode::Enter => app.menu_field = MenuField::MealType,
                _ => edit_text(&mut app.menu_name_input, key),
            },
            MenuField::MealType => match key.code {
                KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') | KeyCode::Char('h')
                | KeyCode::Char('l') => {
                    app.draft.meal_type = app.draft.meal_type.next();
                }
                KeyCode::Enter => app.menu_field = MenuField::Ingredient,
                _ => {}
            },
            MenuField::Ingredient => match key.code {
                // Enter on an empty ingredient creates the menu
                KeyCode::Enter if app.ingredient_input.is_empty() => app.submit_menu_form(),
                KeyCode::Enter => app.menu_form_add_ingredient(),
                KeyCode::Backspace if app.ingredient_input.is_empty() => {
                    app.menu_form_remove_last_ingredient();
                }
                _ => edit_text(&mut app.ingredient_input, key),
            },
        },
    }
}

fn handle_api_key_popup(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.popup = None;
            app.api_key_input.clear();
        }
        KeyCode::Enter => app.save_api_key(),
        _ => edit_text(&mut app.api_key_input, key),
    }
}

fn handle_provider_picker(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.popup = None,
        KeyCode::Char('j') | KeyCode::Down => app.provider_picker_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.provider_picker_nav_up(),
        KeyCode::Enter => app.select_provider(),
        // Change the key of the highlighted provider
        KeyCode::Char('K') => {
            if let Some(provider) = app
                .provider_picker_state
                .selected()
                .and_then(|i| mercado_core::Provider::all().get(i).copied())
            {
                app.open_api_key_input(provider);
            }
        }
        _ => {}
    }
}

fn handle_prompt_popup(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('r') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.restore_default_prompt();
        return;
    }

    match key.code {
        KeyCode::Esc => app.popup = None,
        KeyCode::Enter => app.save_system_prompt(),
        _ => edit_text(&mut app.prompt_input, key),
    }
}

/// Cursor movement and character editing shared by every text box
fn edit_text(input: &mut crate::app::TextInput, key: KeyEvent) {
    match key.code {
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.left(),
        KeyCode::Right => input.right(),
        KeyCode::Home => input.home(),
        KeyCode::End => input.end(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => input.insert(c),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mercado_core::{LocalStore, Settings};

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn app() -> App {
        App::new(Settings::load_with_env(LocalStore::in_memory(), |_| None))
    }

    #[test]
    fn test_typing_q_while_editing_does_not_quit() {
        let mut app = app();
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "queso");
        press(&mut app, KeyCode::Enter);
        assert!(!app.should_quit);
        assert!(app.planner.shopping.contains_name("queso"));

        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_menu_form_by_keyboard() {
        let mut app = app();
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "Lentejas");
        press(&mut app, KeyCode::Enter); // to meal type
        press(&mut app, KeyCode::Right); // comida -> cena
        press(&mut app, KeyCode::Enter); // to ingredients
        type_text(&mut app, "lentejas");
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "chorizo");
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "zanahoria");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Backspace); // drops zanahoria
        press(&mut app, KeyCode::Enter); // empty input submits

        assert_eq!(app.popup, None);
        let menu = &app.planner.menus.menus()[0];
        assert_eq!(menu.name, "Lentejas");
        assert_eq!(menu.meal_type, mercado_core::MealType::Dinner);
        assert_eq!(menu.ingredients, vec!["lentejas", "chorizo"]);
        assert_eq!(app.planner.shopping.len(), 2);
    }
}
