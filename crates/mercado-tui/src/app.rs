use mercado_core::{
    AssistantGateway, AssistantProfile, Category, CategoryFilter, Conversation, MenuDraft, Planner,
    Provider, Settings, ShoppingItem, Turn,
};
use ratatui::widgets::ListState;
use tracing::{debug, error};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Shopping,
    Menus,
    Assistant,
}

impl Screen {
    pub fn all() -> [Screen; 3] {
        [Screen::Shopping, Screen::Menus, Screen::Assistant]
    }

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Shopping => "Lista de Compra",
            Screen::Menus => "Menús Semanales",
            Screen::Assistant => "Asistente",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Screen::Shopping => Screen::Menus,
            Screen::Menus => Screen::Assistant,
            Screen::Assistant => Screen::Shopping,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    ApiKey,
    ProviderPicker,
    SystemPrompt,
    MenuForm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuField {
    #[default]
    Name,
    MealType,
    Ingredient,
}

impl MenuField {
    pub fn next(&self) -> Self {
        match self {
            MenuField::Name => MenuField::MealType,
            MenuField::MealType => MenuField::Ingredient,
            MenuField::Ingredient => MenuField::Name,
        }
    }
}

/// Transient footer message, the terminal stand-in for a toast
#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
    ticks_left: u8,
}

const NOTICE_TICKS: u8 = 12;

/// Single-line text input with a character-based cursor
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    pub value: String,
    pub cursor: usize,
}

impl TextInput {
    pub fn with_value(value: &str) -> Self {
        Self {
            value: value.to_string(),
            cursor: value.chars().count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.value, self.cursor);
        self.value.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.value, self.cursor);
            self.value.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.value.chars().count() {
            let byte_pos = char_to_byte_index(&self.value, self.cursor);
            self.value.remove(byte_pos);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.value.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    /// Return the contents and reset the input
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.value)
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,
    pub popup: Option<Popup>,
    pub notice: Option<Notice>,

    // Data
    pub planner: Planner,
    pub settings: Settings,
    pub gateway: AssistantGateway,

    // Shopping list state
    pub item_input: TextInput,
    pub new_item_category: Category,
    pub category_filter: CategoryFilter,
    pub item_state: ListState,

    // Menu state
    pub menu_state: ListState,
    pub draft: MenuDraft,
    pub menu_field: MenuField,
    pub menu_name_input: TextInput,
    pub ingredient_input: TextInput,

    // Assistant state (chat history)
    pub conversation: Conversation,
    pub chat_input: TextInput,
    pub chat_loading: bool,
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    pub chat_task: Option<tokio::task::JoinHandle<String>>,
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Settings popups
    pub api_key_input: TextInput,
    pub api_key_target: Provider,
    pub provider_picker_state: ListState,
    pub prompt_input: TextInput,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        Self::with_gateway(settings, AssistantGateway::new())
    }

    pub fn with_gateway(settings: Settings, gateway: AssistantGateway) -> Self {
        let api_key_target = settings.provider();
        Self {
            should_quit: false,
            screen: Screen::Shopping,
            input_mode: InputMode::Normal,
            popup: None,
            notice: None,

            planner: Planner::new(),
            settings,
            gateway,

            item_input: TextInput::default(),
            new_item_category: Category::default(),
            category_filter: CategoryFilter::All,
            item_state: ListState::default(),

            menu_state: ListState::default(),
            draft: MenuDraft::default(),
            menu_field: MenuField::default(),
            menu_name_input: TextInput::default(),
            ingredient_input: TextInput::default(),

            conversation: Conversation::new(),
            chat_input: TextInput::default(),
            chat_loading: false,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_task: None,
            animation_frame: 0,

            api_key_input: TextInput::default(),
            api_key_target,
            provider_picker_state: ListState::default(),
            prompt_input: TextInput::default(),
        }
    }

    pub fn notify(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            is_error: false,
            ticks_left: NOTICE_TICKS,
        });
    }

    pub fn notify_error(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            is_error: true,
            ticks_left: NOTICE_TICKS,
        });
    }

    /// Advance animations and expire the notice (called by Tick event)
    pub fn tick(&mut self) {
        if self.chat_loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        if let Some(notice) = &mut self.notice {
            notice.ticks_left = notice.ticks_left.saturating_sub(1);
            if notice.ticks_left == 0 {
                self.notice = None;
            }
        }
    }

    // Shopping list

    pub fn visible_items(&self) -> Vec<&ShoppingItem> {
        self.planner.shopping.filtered(self.category_filter)
    }

    fn selected_item_id(&self) -> Option<Uuid> {
        let items = self.visible_items();
        self.item_state
            .selected()
            .and_then(|i| items.get(i))
            .map(|item| item.id)
    }

    pub fn items_nav_down(&mut self) {
        let len = self.visible_items().len();
        if len > 0 {
            let i = self.item_state.selected().unwrap_or(0);
            self.item_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn items_nav_up(&mut self) {
        let i = self.item_state.selected().unwrap_or(0);
        self.item_state.select(Some(i.saturating_sub(1)));
    }

    /// Keep the selection inside the (possibly filtered) list
    fn clamp_item_selection(&mut self) {
        let len = self.visible_items().len();
        if len == 0 {
            self.item_state.select(None);
        } else {
            let i = self.item_state.selected().unwrap_or(0);
            self.item_state.select(Some(i.min(len - 1)));
        }
    }

    pub fn add_item_from_input(&mut self) {
        match self.planner.shopping.add(&self.item_input.value, self.new_item_category) {
            Ok(item) => {
                self.item_input.clear();
                self.notify(format!("{} se ha añadido a tu lista de compras", item.name));
                self.clamp_item_selection();
            }
            Err(e) => self.notify_error(e.to_string()),
        }
    }

    pub fn toggle_selected_item(&mut self) {
        if let Some(id) = self.selected_item_id() {
            if let Err(e) = self.planner.shopping.toggle(id) {
                error!("toggle failed: {e}");
            }
        }
    }

    pub fn remove_selected_item(&mut self) {
        if let Some(id) = self.selected_item_id() {
            if let Err(e) = self.planner.shopping.remove(id) {
                error!("remove failed: {e}");
            }
            self.clamp_item_selection();
        }
    }

    pub fn cycle_filter(&mut self) {
        self.category_filter = self.category_filter.next();
        self.item_state.select(None);
        self.clamp_item_selection();
    }

    pub fn cycle_new_item_category(&mut self) {
        self.new_item_category = self.new_item_category.next();
    }

    // Menus

    fn selected_menu_id(&self) -> Option<Uuid> {
        self.menu_state
            .selected()
            .and_then(|i| self.planner.menus.menus().get(i))
            .map(|menu| menu.id)
    }

    pub fn menus_nav_down(&mut self) {
        let len = self.planner.menus.len();
        if len > 0 {
            let i = self.menu_state.selected().unwrap_or(0);
            self.menu_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn menus_nav_up(&mut self) {
        let i = self.menu_state.selected().unwrap_or(0);
        self.menu_state.select(Some(i.saturating_sub(1)));
    }

    pub fn toggle_selected_menu_expanded(&mut self) {
        if let Some(id) = self.selected_menu_id() {
            self.planner.menus.toggle_expanded(id);
        }
    }

    pub fn import_selected_menu(&mut self) {
        let Some(id) = self.selected_menu_id() else {
            return;
        };
        let name = self
            .planner
            .menus
            .get(id)
            .map(|m| m.name.clone())
            .unwrap_or_default();
        match self.planner.import_menu_ingredients(id) {
            Ok(outcome) if outcome.is_empty() => {
                self.notify("Todos los ingredientes ya están en tu lista de compras");
            }
            Ok(outcome) => {
                self.notify(format!(
                    "{} ingredientes de {} añadidos a tu lista",
                    outcome.added_count(),
                    name
                ));
                self.clamp_item_selection();
            }
            Err(e) => self.notify_error(e.to_string()),
        }
    }

    pub fn remove_selected_menu(&mut self) {
        if let Some(id) = self.selected_menu_id() {
            if let Err(e) = self.planner.remove_menu(id) {
                error!("remove menu failed: {e}");
            }
            let len = self.planner.menus.len();
            if len == 0 {
                self.menu_state.select(None);
            } else if let Some(i) = self.menu_state.selected() {
                self.menu_state.select(Some(i.min(len - 1)));
            }
        }
    }

    pub fn open_menu_form(&mut self) {
        self.draft = MenuDraft::default();
        self.menu_name_input.clear();
        self.ingredient_input.clear();
        self.menu_field = MenuField::Name;
        self.popup = Some(Popup::MenuForm);
    }

    pub fn menu_form_add_ingredient(&mut self) {
        let ingredient = self.ingredient_input.take();
        self.draft.add_ingredient(&ingredient);
    }

    pub fn menu_form_remove_last_ingredient(&mut self) {
        self.draft.ingredients.pop();
    }

    pub fn submit_menu_form(&mut self) {
        // an ingredient still in the input box counts
        if !self.ingredient_input.is_empty() {
            self.menu_form_add_ingredient();
        }
        self.draft.name = self.menu_name_input.value.clone();

        match self.planner.create_menu(&self.draft) {
            Ok((menu, outcome)) => {
                if outcome.is_empty() {
                    self.notify(format!("{} se ha añadido a tus menús", menu.name));
                } else {
                    self.notify(format!(
                        "{} se ha añadido a tus menús · {} ingredientes nuevos en tu lista",
                        menu.name,
                        outcome.added_count()
                    ));
                }
                self.popup = None;
                self.draft.clear();
                self.menu_name_input.clear();
                self.menu_state.select(Some(self.planner.menus.len() - 1));
                self.clamp_item_selection();
            }
            Err(e) => self.notify_error(e.to_string()),
        }
    }

    // Assistant

    pub fn submit_chat(&mut self) {
        if self.chat_input.is_empty() || self.chat_task.is_some() {
            return;
        }

        let input = self.chat_input.take();
        match self.conversation.submit(&mut self.planner, &input) {
            Turn::Answered => {
                self.clamp_item_selection();
            }
            Turn::NeedsCompletion(text) => {
                // Spawn background task to query the provider
                let gateway = self.gateway.clone();
                let profile = AssistantProfile::from(&self.settings);
                debug!(provider = profile.provider.as_str(), "forwarding to assistant");
                self.chat_loading = true;
                self.chat_task = Some(tokio::spawn(async move {
                    gateway.generate_response(&text, &profile).await
                }));
            }
        }
        self.scroll_chat_to_bottom();
    }

    /// Collect the reply of a finished assistant task, if any
    pub async fn poll_chat_task(&mut self) {
        let finished = self
            .chat_task
            .as_ref()
            .is_some_and(|task| task.is_finished());
        if !finished {
            return;
        }

        if let Some(task) = self.chat_task.take() {
            let reply = match task.await {
                Ok(reply) => reply,
                Err(e) => {
                    error!("assistant task failed: {e}");
                    mercado_core::gateway::FALLBACK_REPLY.to_string()
                }
            };
            self.conversation.push_assistant(reply);
            self.chat_loading = false;
            self.scroll_chat_to_bottom();
        }
    }

    pub fn chat_scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    pub fn chat_scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    /// Scroll chat to bottom so the latest reply (or "Pensando...") is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: usize = 0;
        for msg in self.conversation.messages() {
            total_lines += 1; // Role line ("Tú:" or "Mercado Mágico:")
            for line in msg.content.lines() {
                let char_count = line.chars().count();
                total_lines += (char_count / wrap_width) + 1;
            }
            total_lines += 1; // Blank line after message
        }
        if self.chat_loading {
            total_lines += 2;
        }

        let visible_height = if self.chat_height > 0 { self.chat_height } else { 20 };
        let total_lines = u16::try_from(total_lines).unwrap_or(u16::MAX);
        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }

    // Settings

    pub fn open_api_key_input(&mut self, provider: Provider) {
        self.api_key_target = provider;
        self.api_key_input = TextInput::with_value(self.settings.api_key_for(provider));
        self.popup = Some(Popup::ApiKey);
    }

    pub fn save_api_key(&mut self) {
        let provider = self.api_key_target;
        if let Err(e) = self.settings.set_api_key(provider, &self.api_key_input.value) {
            self.notify_error(e.to_string());
            return;
        }
        if self.settings.provider() != provider {
            if let Err(e) = self.settings.set_provider(provider) {
                self.notify_error(e.to_string());
                return;
            }
        }
        self.api_key_input.clear();
        self.popup = None;
        self.notify("Tu API Key ha sido guardada correctamente");
    }

    pub fn open_provider_picker(&mut self) {
        let current_idx = Provider::all()
            .iter()
            .position(|p| *p == self.settings.provider())
            .unwrap_or(0);
        self.provider_picker_state.select(Some(current_idx));
        self.popup = Some(Popup::ProviderPicker);
    }

    pub fn provider_picker_nav_down(&mut self) {
        let len = Provider::all().len();
        let i = self.provider_picker_state.selected().unwrap_or(0);
        self.provider_picker_state.select(Some((i + 1).min(len - 1)));
    }

    pub fn provider_picker_nav_up(&mut self) {
        let i = self.provider_picker_state.selected().unwrap_or(0);
        self.provider_picker_state.select(Some(i.saturating_sub(1)));
    }

    pub fn select_provider(&mut self) {
        let Some(provider) = self
            .provider_picker_state
            .selected()
            .and_then(|i| Provider::all().get(i).copied())
        else {
            return;
        };

        // Ask for a key first if the provider has none
        if self.settings.key_source(provider).is_none() {
            self.open_api_key_input(provider);
            return;
        }

        match self.settings.set_provider(provider) {
            Ok(()) => {
                self.popup = None;
                self.notify(format!("Proveedor: {}", provider.display_name()));
            }
            Err(e) => self.notify_error(e.to_string()),
        }
    }

    pub fn open_prompt_editor(&mut self) {
        self.prompt_input = TextInput::with_value(self.settings.system_prompt());
        self.popup = Some(Popup::SystemPrompt);
    }

    pub fn restore_default_prompt(&mut self) {
        self.prompt_input = TextInput::with_value(Settings::default_system_prompt());
    }

    pub fn save_system_prompt(&mut self) {
        match self.settings.set_system_prompt(&self.prompt_input.value) {
            Ok(()) => {
                self.popup = None;
                self.notify("Tu prompt del sistema ha sido guardado correctamente");
            }
            Err(e) => self.notify_error(e.to_string()),
        }
    }
}
