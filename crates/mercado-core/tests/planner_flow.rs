use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use mercado_core::ai::CompletionRequest;
use mercado_core::{
    AssistantGateway, AssistantProfile, Category, CompletionBackend, Conversation, GatewayError,
    LocalStore, MealType, MenuDraft, Planner, Provider, Settings,
};

#[test]
fn import_adds_only_novel_ingredients_in_order() {
    let mut planner = Planner::new();
    planner.shopping.add("leche", Category::Dairy).unwrap();

    let draft = MenuDraft::new("Tostadas", MealType::Breakfast).with_ingredients(&["leche", "pan"]);
    planner.create_menu(&draft).unwrap();

    let items = planner.shopping.items();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "leche");
    assert_eq!(items[0].category, Category::Dairy);
    assert_eq!(items[1].name, "pan");
    assert_eq!(items[1].category, Category::Other);
    assert!(!items[1].checked);
}

#[test]
fn import_over_many_existing_names() {
    let existing = ["Arroz", "ajo", "CEBOLLA", "pimiento"];
    let candidates = ["arroz", "Gambas", "ajo", "Azafrán", "cebolla", "Guisantes"];

    let mut planner = Planner::new();
    for name in existing {
        planner.shopping.add(name, Category::Vegetable).unwrap();
    }
    let outcome = planner.shopping.import_ingredients(&candidates);

    let added: Vec<&str> = outcome.added.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(added, vec!["Gambas", "Azafrán", "Guisantes"]);
    assert_eq!(outcome.skipped, vec!["arroz", "ajo", "cebolla"]);
    assert_eq!(planner.shopping.len(), existing.len() + 3);
    assert!(planner.shopping.items()[existing.len()..]
        .iter()
        .all(|i| !i.checked && i.category == Category::Other));
}

struct CountingBackend {
    calls: AtomicUsize,
}

#[async_trait]
impl CompletionBackend for CountingBackend {
    async fn complete(
        &self,
        _endpoint: &str,
        _api_key: &str,
        request: &CompletionRequest,
    ) -> Result<String, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("eco: {}", request.messages[1].content))
    }
}

#[tokio::test]
async fn conversation_routes_commands_locally_and_questions_remotely() {
    let backend = Arc::new(CountingBackend {
        calls: AtomicUsize::new(0),
    });
    let gateway = AssistantGateway::with_backend(backend.clone());

    let mut settings = Settings::load_with_env(LocalStore::in_memory(), |_| None);
    let mut planner = Planner::new();
    let mut chat = Conversation::new();

    // no key yet: the question is answered with the fixed prompt, offline
    let profile = AssistantProfile::from(&settings);
    let reply = chat
        .respond(&mut planner, &gateway, &profile, "¿Qué postre hago?")
        .await;
    assert_eq!(reply.content, "Por favor, introduce tu API key de Groq para continuar.");
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);

    settings.set_api_key(Provider::Groq, "gsk_test").unwrap();
    let profile = AssistantProfile::from(&settings);

    chat.respond(&mut planner, &gateway, &profile, "añade fresas en frutas")
        .await;
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    assert_eq!(planner.shopping.items()[0].category, Category::Fruit);

    let reply = chat
        .respond(&mut planner, &gateway, &profile, "¿Qué postre hago con fresas?")
        .await;
    assert_eq!(reply.content, "eco: ¿Qué postre hago con fresas?");
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    assert_eq!(chat.messages().len(), 6);
}
