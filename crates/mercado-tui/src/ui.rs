use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap},
};
use mercado_core::{Category, ChatRole, MealType, Provider};
use crate::app::{App, InputMode, MenuField, Popup, Screen, TextInput};

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("**") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("**") else {
            break;
        };
        if start > 0 {
            spans.push(Span::raw(rest[..start].to_string()));
        }
        if end > 0 {
            spans.push(Span::styled(
                after[..end].to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        }
        rest = &after[end + 2..];
    }

    // Push any remaining text (including an unclosed "**")
    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    Line::from(spans)
}

fn category_color(category: Category) -> Color {
    match category {
        Category::Fruit => Color::Green,
        Category::Vegetable => Color::LightGreen,
        Category::Meat => Color::Red,
        Category::Dairy => Color::Blue,
        Category::Other => Color::Gray,
    }
}

fn meal_type_color(meal_type: MealType) -> Color {
    match meal_type {
        MealType::Breakfast => Color::Yellow,
        MealType::Lunch => Color::LightBlue,
        MealType::Dinner => Color::Magenta,
    }
}

/// Input text with a visible cursor, for boxes that wrap
fn with_cursor_marker(input: &TextInput) -> String {
    let mut text: String = input.value.chars().take(input.cursor).collect();
    text.push('▏');
    text.extend(input.value.chars().skip(input.cursor));
    text
}

fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, tabs, body, footer
    let [header_area, tabs_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_tabs(app, frame, tabs_area);

    match app.screen {
        Screen::Shopping => render_shopping_screen(app, frame, body_area),
        Screen::Menus => render_menus_screen(app, frame, body_area),
        Screen::Assistant => render_assistant_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);

    match app.popup {
        Some(Popup::ApiKey) => render_api_key_input(app, frame, area),
        Some(Popup::ProviderPicker) => render_provider_picker(app, frame, area),
        Some(Popup::SystemPrompt) => render_prompt_editor(app, frame, area),
        Some(Popup::MenuForm) => render_menu_form(app, frame, area),
        None => {}
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let pending = app.planner.shopping.pending_count();
    let pending_indicator = if pending > 0 {
        format!(" [{} por comprar]", pending)
    } else {
        String::new()
    };

    let key_indicator = if app.settings.has_api_key() {
        Span::styled(
            format!(" {} ", app.settings.provider().display_name()),
            Style::default().fg(Color::Green),
        )
    } else {
        Span::styled(" sin API key ", Style::default().fg(Color::Red))
    };

    let title = Line::from(vec![
        Span::styled(" Mercado Mágico ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(pending_indicator, Style::default().fg(Color::Gray)),
        Span::raw(" "),
        key_indicator,
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_tabs(app: &App, frame: &mut Frame, area: Rect) {
    let titles: Vec<Line> = Screen::all()
        .iter()
        .enumerate()
        .map(|(i, screen)| Line::from(format!(" {} {} ", i + 1, screen.title())))
        .collect();
    let selected = Screen::all()
        .iter()
        .position(|s| *s == app.screen)
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::Gray))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .divider("|");
    frame.render_widget(tabs, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    if let Some(notice) = &app.notice {
        let style = if notice.is_error {
            Style::default().bg(Color::Red).fg(Color::White)
        } else {
            Style::default().bg(Color::Green).fg(Color::Black)
        };
        let footer = Paragraph::new(format!(" {} ", notice.text)).style(style);
        frame.render_widget(footer, area);
        return;
    }

    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " EDITAR ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let pairs: &[(&str, &str)] = match (app.screen, app.input_mode) {
        (Screen::Shopping, InputMode::Normal) => &[
            ("j/k", "nav"),
            ("Space", "marcar"),
            ("d", "quitar"),
            ("a", "añadir"),
            ("c", "categoría"),
            ("f", "filtro"),
        ],
        (Screen::Shopping, InputMode::Editing) => &[
            ("Enter", "añadir"),
            ("Tab", "categoría"),
            ("Esc", "salir"),
        ],
        (Screen::Menus, _) => &[
            ("j/k", "nav"),
            ("Enter", "ingredientes"),
            ("i", "a la lista"),
            ("n", "nuevo"),
            ("d", "eliminar"),
        ],
        (Screen::Assistant, InputMode::Normal) => &[("i", "escribir"), ("j/k", "scroll")],
        (Screen::Assistant, InputMode::Editing) => &[("Enter", "enviar"), ("Esc", "salir")],
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    for (key, label) in pairs {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }
    if app.input_mode == InputMode::Normal {
        for (key, label) in [("Tab", "pestaña"), ("K", "API key"), ("P", "proveedor"), ("S", "prompt"), ("q", "salir")] {
            spans.push(Span::styled(format!(" {} ", key), key_style));
            spans.push(Span::styled(format!(" {} ", label), label_style));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_shopping_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [input_area, filter_area, list_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .areas(area);

    let editing = app.input_mode == InputMode::Editing;
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing { Color::Yellow } else { Color::DarkGray }))
        .title(Line::from(vec![
            Span::raw(" Añadir un nuevo ítem "),
            Span::styled(
                format!("[{}] ", app.new_item_category.label()),
                Style::default().fg(category_color(app.new_item_category)),
            ),
        ]));
    let input = Paragraph::new(app.item_input.value.as_str()).block(input_block);
    frame.render_widget(input, input_area);
    if editing {
        let cursor_x = (app.item_input.cursor as u16).min(input_area.width.saturating_sub(3));
        frame.set_cursor_position((input_area.x + 1 + cursor_x, input_area.y + 1));
    }

    let filter = Paragraph::new(Line::from(vec![
        Span::styled(" Filtro: ", Style::default().fg(Color::Gray)),
        Span::styled(app.category_filter.label(), Style::default().fg(Color::Cyan)),
    ]));
    frame.render_widget(filter, filter_area);

    let list_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing { Color::DarkGray } else { Color::Cyan }))
        .title(" Tu Lista de Compras ");

    let items: Vec<ListItem> = app
        .visible_items()
        .into_iter()
        .map(|item| {
            let (mark, name_style) = if item.checked {
                (
                    Span::styled("[✓] ", Style::default().fg(Color::Green)),
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::CROSSED_OUT),
                )
            } else {
                (Span::raw("[ ] "), Style::default())
            };
            ListItem::new(Line::from(vec![
                mark,
                Span::styled(item.name.clone(), name_style),
                Span::raw("  "),
                Span::styled(
                    item.category.label(),
                    Style::default().fg(category_color(item.category)),
                ),
            ]))
        })
        .collect();

    if items.is_empty() {
        let empty = Paragraph::new("Tu lista está vacía. Añade algunos ítems.")
            .style(Style::default().fg(Color::DarkGray))
            .block(list_block);
        frame.render_widget(empty, list_area);
        return;
    }

    let list = List::new(items)
        .block(list_block)
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, list_area, &mut app.item_state);
}

fn render_menus_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Tus Menús Semanales ");

    if app.planner.menus.is_empty() {
        let empty = Paragraph::new("No has creado ningún menú todavía. Pulsa n para crear uno.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = app
        .planner
        .menus
        .menus()
        .iter()
        .map(|menu| {
            let mut lines = vec![Line::from(vec![
                Span::styled(
                    format!("[{}] ", menu.meal_type.label()),
                    Style::default().fg(meal_type_color(menu.meal_type)),
                ),
                Span::styled(menu.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(
                    format!("  ({} ingredientes)", menu.ingredients.len()),
                    Style::default().fg(Color::DarkGray),
                ),
            ])];
            if app.planner.menus.is_expanded(menu.id) {
                lines.push(Line::from(Span::styled(
                    format!("    Ingredientes: {}", menu.ingredients.join(", ")),
                    Style::default().fg(Color::Gray),
                )));
            }
            ListItem::new(Text::from(lines))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, area, &mut app.menu_state);
}

fn render_assistant_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(
            " {}: {} ",
            app.settings.provider().display_name(),
            app.settings.model()
        ));

    let chat_text = if app.conversation.messages().is_empty() && !app.chat_loading {
        Text::from(Span::styled(
            "Pregúntame por recetas o escribe «ayuda» para ver las órdenes...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for msg in app.conversation.messages() {
            match msg.role {
                ChatRole::User => {
                    lines.push(Line::from(Span::styled(
                        "Tú:",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )));
                    lines.push(Line::from(msg.content.clone()));
                }
                ChatRole::Assistant => {
                    lines.push(Line::from(Span::styled(
                        "Mercado Mágico:",
                        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                    )));
                    for line in msg.content.lines() {
                        lines.push(parse_markdown_line(line));
                    }
                }
            }
            lines.push(Line::default());
        }

        if app.chat_loading {
            lines.push(Line::from(Span::styled(
                "Mercado Mágico:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Pensando{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    let editing = app.input_mode == InputMode::Editing;
    let input_title = if app.chat_loading {
        " Esperando respuesta... "
    } else {
        " Mensaje "
    };
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing { Color::Yellow } else { Color::DarkGray }))
        .title(input_title);
    let input = Paragraph::new(app.chat_input.value.as_str()).block(input_block);
    frame.render_widget(input, input_area);

    if editing {
        let cursor_x = (app.chat_input.cursor as u16).min(input_area.width.saturating_sub(3));
        frame.set_cursor_position((input_area.x + 1 + cursor_x, input_area.y + 1));
    }
}

fn render_menu_form(app: &App, frame: &mut Frame, area: Rect) {
    let popup_area = centered_popup(area, 64, 14);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Crear nuevo menú ");
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let [name_area, meal_area, ingredient_area, chips_area, hint_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .spacing(1)
    .areas(inner);

    let label_style = |field: MenuField| {
        if app.menu_field == field {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        }
    };

    let name = Paragraph::new(Line::from(vec![
        Span::styled("Nombre:       ", label_style(MenuField::Name)),
        Span::raw(app.menu_name_input.value.clone()),
    ]));
    frame.render_widget(name, name_area);

    let meal = Paragraph::new(Line::from(vec![
        Span::styled("Tipo:         ", label_style(MenuField::MealType)),
        Span::styled(
            format!("◂ {} ▸", app.draft.meal_type.label()),
            Style::default().fg(meal_type_color(app.draft.meal_type)),
        ),
    ]));
    frame.render_widget(meal, meal_area);

    let ingredient = Paragraph::new(Line::from(vec![
        Span::styled("Ingrediente:  ", label_style(MenuField::Ingredient)),
        Span::raw(app.ingredient_input.value.clone()),
    ]));
    frame.render_widget(ingredient, ingredient_area);

    let chips = if app.draft.ingredients.is_empty() {
        Paragraph::new("Sin ingredientes todavía").style(Style::default().fg(Color::DarkGray))
    } else {
        Paragraph::new(format!("Ingredientes: {}", app.draft.ingredients.join(" · ")))
            .wrap(Wrap { trim: true })
    };
    frame.render_widget(chips, chips_area);

    let hint = Paragraph::new("Tab campo · Enter añade · Enter vacío o Ctrl-S crea · Esc cancela")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(hint, hint_area);

    // Show cursor in the active text field
    let (row, input) = match app.menu_field {
        MenuField::Name => (name_area, &app.menu_name_input),
        MenuField::Ingredient => (ingredient_area, &app.ingredient_input),
        MenuField::MealType => return,
    };
    let cursor_x = (14 + input.cursor as u16).min(row.width.saturating_sub(1));
    frame.set_cursor_position((row.x + cursor_x, row.y));
}

fn render_provider_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let providers = Provider::all();
    let popup_area = centered_popup(area, 50, providers.len() as u16 + 4);
    frame.render_widget(Clear, popup_area);

    let items: Vec<ListItem> = providers
        .iter()
        .map(|provider| {
            let status = match app.settings.key_source(*provider) {
                Some(source) => Span::styled(
                    format!(" (key: {})", source.as_str()),
                    Style::default().fg(Color::Green),
                ),
                None => Span::styled(" (sin key)", Style::default().fg(Color::Red)),
            };
            let current = if *provider == app.settings.provider() { "● " } else { "  " };
            ListItem::new(Line::from(vec![
                Span::raw(current),
                Span::raw(provider.display_name()),
                status,
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" Proveedor (Enter elegir · K cambiar key · Esc) "),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, popup_area, &mut app.provider_picker_state);
}

fn render_api_key_input(app: &App, frame: &mut Frame, area: Rect) {
    let popup_area = centered_popup(area, 64, 8);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(format!(" API Key de {} ", app.api_key_target.display_name()));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let instructions = Paragraph::new(format!(
        "Consíguela en {}. Enter guarda, Esc cancela.",
        app.api_key_target.key_url()
    ))
    .style(Style::default().fg(Color::Gray))
    .wrap(Wrap { trim: true });
    frame.render_widget(instructions, Rect::new(inner.x, inner.y, inner.width, 2));

    // Mask the key, keeping the last 4 chars visible
    let value = &app.api_key_input.value;
    let char_count = value.chars().count();
    let display_text = if char_count <= 4 {
        "*".repeat(char_count)
    } else {
        let last_four: String = value.chars().skip(char_count - 4).collect();
        format!("{}{}", "*".repeat((char_count - 4).min(40)), last_four)
    };

    let input_area = Rect::new(inner.x, inner.y + 3, inner.width, 1);
    frame.render_widget(
        Paragraph::new(display_text).style(Style::default().fg(Color::Cyan)),
        input_area,
    );

    let cursor_x = (app.api_key_input.cursor.min(44) as u16).min(input_area.width.saturating_sub(1));
    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));

    let status = Paragraph::new(format!("{} caracteres", char_count))
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(status, Rect::new(inner.x, inner.y + 5, inner.width, 1));
}

fn render_prompt_editor(app: &App, frame: &mut Frame, area: Rect) {
    let popup_area = centered_popup(area, 72, 16);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Configurar Prompt del Sistema ");
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let [text_area, hint_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(inner);

    let text = Paragraph::new(with_cursor_marker(&app.prompt_input)).wrap(Wrap { trim: false });
    frame.render_widget(text, text_area);

    let hint = Paragraph::new("Enter guarda · Ctrl-R restaura el predeterminado · Esc cancela")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(hint, hint_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_markdown_bold_spans() {
        let line = parse_markdown_line("Compra **tomates** y **pan**");
        assert_eq!(plain(&line), "Compra tomates y pan");
        assert_eq!(line.spans.len(), 4);
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_markdown_unclosed_is_literal() {
        let line = parse_markdown_line("1. **Lunes: lentejas");
        assert_eq!(plain(&line), "1. **Lunes: lentejas");
    }

    #[test]
    fn test_cursor_marker_position() {
        let mut input = TextInput::with_value("sé breve");
        input.left();
        assert_eq!(with_cursor_marker(&input), "sé brev▏e");
    }
}
