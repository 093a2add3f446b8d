/// Integration tests for the elder side of the board.
/// Spins up a real backend on a free port and drives the public library
/// surface: wizard submit, optimistic edit and delete, reconciliation.
use careboard::{
    model::{TaskDraft, TaskStatus},
    server::{build_router, seed, ServerState},
    wizard::AddTaskWizard,
    BackendClient, Error, TaskBoard,
};
use std::sync::Arc;

const ELDER: &str = "elder@example.com";

/// Start a seeded backend and return its base URL.
async fn start_backend() -> String {
    let state = ServerState::new();
    state
        .store
        .load_seed(seed::demo_tasks().unwrap(), seed::demo_users())
        .await;
    serve(state).await
}

async fn serve(state: Arc<ServerState>) -> String {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    format!("http://{addr}")
}

fn draft(title: &str) -> TaskDraft {
    TaskDraft {
        title: title.to_string(),
        body: "Details in the title.".to_string(),
        date: "2025-11-20".to_string(),
        category: "Groceries".to_string(),
        elder_id: ELDER.to_string(),
        latitude: 30.2672,
        longitude: -97.7431,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_wizard_submit_lands_a_pending_task_on_the_board() {
    let url = start_backend().await;
    let client = BackendClient::new(&url);
    let board = TaskBoard::new(client.clone(), ELDER);
    board.refresh().await.unwrap();
    assert!(board.tasks().await.is_empty(), "demo elder starts empty");

    let elder = client.fetch_user(ELDER).await.unwrap();
    let mut wizard = AddTaskWizard::new();
    wizard.next().unwrap();
    wizard.set_category("Groceries");
    wizard.next().unwrap();
    wizard.set_title("Milk run");
    wizard.set_body("Two bags from the corner store.");
    wizard.next().unwrap();
    wizard.choose_later("2025-11-20");
    wizard.next().unwrap();
    wizard.set_payment(false);
    wizard.next().unwrap();
    let created = wizard.submit(&board, &elder).await.unwrap();
    assert!(created.id.starts_with("task-"));

    // Reconciliation replaced the placeholder with the server record.
    let tasks = board.tasks().await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, created.id);
    assert_eq!(tasks[0].status, TaskStatus::Pending);
    assert_eq!(tasks[0].elder_id, ELDER);
    assert!(tasks[0].volunteer_id.is_empty());

    let (active, history) = board.partition().await;
    assert_eq!(active.len(), 1);
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_edit_converges_with_the_server() {
    let url = start_backend().await;
    let client = BackendClient::new(&url);
    let board = TaskBoard::new(client.clone(), ELDER);
    board.refresh().await.unwrap();

    let created = board.add_task(draft("Original title")).await.unwrap();

    let mut edited = board.task(&created.id).await.unwrap();
    edited.title = "Corrected title".to_string();
    edited.body = "Now with the right address.".to_string();
    board.edit_task(edited).await.unwrap();

    assert_eq!(
        board.task(&created.id).await.unwrap().title,
        "Corrected title"
    );

    // The server agrees, not just the local snapshot.
    let server_view = client.fetch_tasks(ELDER).await.unwrap();
    assert_eq!(server_view.len(), 1);
    assert_eq!(server_view[0].title, "Corrected title");
    assert_eq!(server_view[0].body, "Now with the right address.");
}

#[tokio::test]
async fn test_refresh_is_idempotent() {
    let url = start_backend().await;
    let client = BackendClient::new(&url);
    let board = TaskBoard::new(client, ELDER);

    board.add_task(draft("One")).await.unwrap();
    board.add_task(draft("Two")).await.unwrap();

    board.refresh().await.unwrap();
    let first = board.tasks().await;
    board.refresh().await.unwrap();
    let second = board.tasks().await;
    assert_eq!(first, second);
    assert_eq!(second.len(), 2);
}

#[tokio::test]
async fn test_delete_is_permanent() {
    let url = start_backend().await;
    let client = BackendClient::new(&url);
    let board = TaskBoard::new(client, ELDER);
    board.refresh().await.unwrap();

    let created = board.add_task(draft("Doomed")).await.unwrap();
    board.delete_task(&created.id).await.unwrap();
    assert!(board.tasks().await.is_empty());

    // Still gone after a full reload.
    board.refresh().await.unwrap();
    assert!(board.tasks().await.is_empty());
}

#[tokio::test]
async fn test_unknown_account_is_a_not_found_error() {
    let url = start_backend().await;
    let client = BackendClient::new(&url);
    match client.fetch_tasks("ghost@example.com").await {
        Err(Error::UserNotFound(who)) => assert_eq!(who, "ghost@example.com"),
        other => panic!("expected UserNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_deleting_a_missing_task_rolls_back_nothing() {
    let url = start_backend().await;
    let client = BackendClient::new(&url);
    let board = TaskBoard::new(client, ELDER);
    board.refresh().await.unwrap();

    match board.delete_task("task-does-not-exist").await {
        Err(Error::TaskNotFound(_)) => {}
        other => panic!("expected TaskNotFound, got {other:?}"),
    }
    assert!(board.tasks().await.is_empty());
}
