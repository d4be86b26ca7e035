use homeplan_planner::{
    Credentials, Item, ListKind, LocalStorage, Planner, PlannerState, STATE_KEY, SyncMode,
    Weekday,
};
use temp_dir::TempDir;

async fn started(dir: &TempDir) -> Planner {
    let planner = Planner::local(LocalStorage::new(dir.path()));
    planner.start().await;
    planner
}

#[tokio::test]
async fn test_local_planner_starts_enabled() {
    let dir = TempDir::new().unwrap();
    let planner = started(&dir).await;

    assert_eq!(planner.mode(), SyncMode::Local);
    assert!(planner.is_enabled().await);
    assert_eq!(planner.state().await, PlannerState::default());
}

#[tokio::test]
async fn test_added_task_is_listed_unchecked() {
    let dir = TempDir::new().unwrap();
    let planner = started(&dir).await;

    for text in ["Take out bins", "Water plants", "Call plumber"] {
        planner.add_task(text).await.unwrap();

        let state = planner.state().await;
        assert!(
            state
                .tasks
                .iter()
                .any(|item| item.text == text && !item.done)
        );
    }

    let texts: Vec<String> = planner
        .state()
        .await
        .tasks
        .into_iter()
        .map(|item| item.text)
        .collect();
    assert_eq!(texts, vec!["Take out bins", "Water plants", "Call plumber"]);
}

#[tokio::test]
async fn test_double_toggle_restores_done() {
    let dir = TempDir::new().unwrap();
    let planner = started(&dir).await;
    planner.add_task("Vacuum").await.unwrap();

    let item = planner.state().await.tasks[0].clone();
    planner.toggle_task(&item.id, item.done).await.unwrap();
    let toggled = planner.state().await.tasks[0].clone();
    assert!(toggled.done);

    planner.toggle_task(&toggled.id, toggled.done).await.unwrap();
    assert_eq!(planner.state().await.tasks[0].done, item.done);
}

#[tokio::test]
async fn test_delete_removes_exactly_one_id() {
    let dir = TempDir::new().unwrap();
    let planner = started(&dir).await;
    for text in ["Eggs", "Bread", "Butter", "Jam"] {
        planner.add_grocery(text).await.unwrap();
    }

    let before: Vec<Item> = planner.state().await.groceries;
    for victim in before.iter() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        storage.save(&PlannerState {
            groceries: before.clone(),
            ..Default::default()
        });

        let planner = Planner::local(storage);
        planner.start().await;
        planner.delete_grocery(&victim.id).await.unwrap();

        let after = planner.state().await.groceries;
        let expected: Vec<Item> = before
            .iter()
            .filter(|item| item.id != victim.id)
            .cloned()
            .collect();
        assert_eq!(after, expected);
    }
}

#[tokio::test]
async fn test_milk_scenario() {
    let dir = TempDir::new().unwrap();
    let planner = started(&dir).await;

    planner.add_grocery("Milk").await.unwrap();
    let groceries = planner.state().await.groceries;
    assert_eq!(groceries.len(), 1);
    assert_eq!(groceries[0].text, "Milk");
    assert!(!groceries[0].done);

    planner.toggle_grocery(&groceries[0].id, false).await.unwrap();
    let groceries = planner.state().await.groceries;
    assert!(groceries[0].done);

    planner.delete_grocery(&groceries[0].id).await.unwrap();
    assert!(planner.state().await.groceries.is_empty());
}

#[tokio::test]
async fn test_monday_pasta_survives_reload() {
    let dir = TempDir::new().unwrap();
    let planner = started(&dir).await;
    planner.update_meal(Weekday::Monday, "Pasta").await.unwrap();
    drop(planner);

    let reloaded = started(&dir).await;
    let state = reloaded.state().await;
    assert_eq!(state.meal(Weekday::Monday), "Pasta");
    for day in [
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ] {
        assert_eq!(state.meal(day), "");
    }
}

#[tokio::test]
async fn test_round_trip_through_storage() {
    let dir = TempDir::new().unwrap();
    let storage = LocalStorage::new(dir.path());

    let mut state = PlannerState::default();
    state.tasks.push(Item::new("Fix \"door\" hinge"));
    let mut done = Item::new("Mop floor ✓");
    done.done = true;
    state.tasks.push(done);
    state.groceries.push(Item {
        id: "remote".to_owned(),
        text: "Coffee".to_owned(),
        done: false,
        created_at: Some(1_700_000_000_000),
    });
    state.meals.insert(Weekday::Friday, "Pizza night".to_owned());
    state.meals.insert(Weekday::Sunday, String::new());

    storage.save(&state);
    assert_eq!(storage.load(), state);
}

#[tokio::test]
async fn test_malformed_storage_starts_empty() {
    let dir = TempDir::new().unwrap();
    let storage = LocalStorage::new(dir.path());
    storage.set(STATE_KEY, "this is not json").unwrap();

    let planner = Planner::local(storage);
    planner.start().await;

    let state = planner.state().await;
    assert!(state.tasks.is_empty());
    assert!(state.groceries.is_empty());
    assert!(state.meals.is_empty());
}

#[tokio::test]
async fn test_empty_text_is_rejected_without_change() {
    let dir = TempDir::new().unwrap();
    let planner = started(&dir).await;

    let err = planner.add(ListKind::Tasks, "   ").await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(planner.status().await, err.to_string());
    assert!(planner.state().await.tasks.is_empty());
}

#[tokio::test]
async fn test_unknown_id_reports_not_found() {
    let dir = TempDir::new().unwrap();
    let planner = started(&dir).await;

    let err = planner.toggle_task("missing", false).await.unwrap_err();
    assert_eq!(err.to_string(), "tasks item missing not found");
}

#[tokio::test]
async fn test_accounts_are_unavailable_locally() {
    let dir = TempDir::new().unwrap();
    let planner = started(&dir).await;

    let err = planner
        .log_in(Credentials::new("ana@example.com", "secret"))
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert!(planner.log_out().await.is_err());
    assert!(planner.is_enabled().await);
}

#[tokio::test]
async fn test_household_label_is_remembered() {
    let dir = TempDir::new().unwrap();
    let planner = started(&dir).await;

    assert!(planner.connect_household("  ").await.unwrap_err().is_validation());
    planner.connect_household(" smith ").await.unwrap();

    let storage = LocalStorage::new(dir.path());
    assert_eq!(storage.household().as_deref(), Some("smith"));

    let reloaded = started(&dir).await;
    assert_eq!(reloaded.view().await.household.as_deref(), Some("smith"));
}
