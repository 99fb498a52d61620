//! Watch-state lifecycle against a real SQLite database.

use showtracker::db::Store;
use showtracker::domain::views::ShowRecord;
use showtracker::domain::{PlatformId, ShowId, UserId};
use showtracker::entities::WatchStatus;
use showtracker::services::{
    AdminError, AdminService, CreateShow, SeaOrmAdminService, SeaOrmShowService,
    SeaOrmWatchService, SeasonSnapshot, ShowError, ShowService, WatchError, WatchService,
};

struct Household {
    store: Store,
    admin: SeaOrmAdminService,
    shows: SeaOrmShowService,
    watch: SeaOrmWatchService,
    platform: PlatformId,
    alice: UserId,
    bob: UserId,
}

async fn household() -> Household {
    let path = std::env::temp_dir().join(format!("showtracker-engine-{}.db", uuid::Uuid::new_v4()));
    let store = Store::new(&format!("sqlite:{}", path.display()))
        .await
        .expect("Failed to open test database");

    let admin = SeaOrmAdminService::new(store.clone());
    let platform = admin.create_platform("Netflix").await.unwrap().id;
    let alice = admin.create_user("Alice").await.unwrap().id;
    let bob = admin.create_user("Bob").await.unwrap().id;

    Household {
        shows: SeaOrmShowService::new(store.clone(), 15),
        watch: SeaOrmWatchService::new(store.clone()),
        store,
        admin,
        platform,
        alice,
        bob,
    }
}

impl Household {
    async fn show(&self, name: &str, total_seasons: i32, user_ids: Vec<UserId>) -> ShowId {
        self.shows
            .create_show(CreateShow {
                name: name.to_string(),
                total_seasons,
                platform_id: self.platform,
                user_ids,
            })
            .await
            .unwrap()
    }

    async fn record(&self, id: ShowId) -> ShowRecord {
        self.store.get_show(id).await.unwrap().unwrap()
    }

    /// Status and season for one watcher.
    async fn link(&self, show: ShowId, user: UserId) -> (WatchStatus, i32) {
        let record = self.record(show).await;
        let watcher = record
            .watchers
            .iter()
            .find(|w| w.user_id == user)
            .expect("watcher attached");
        (watcher.status, watcher.current_season)
    }
}

#[tokio::test]
async fn test_archer_finishes_on_last_season() {
    let h = household().await;
    let archer = h.show("Archer", 14, vec![h.alice]).await;

    h.watch
        .update_watcher_status(archer, h.alice, WatchStatus::InProgress)
        .await
        .unwrap();
    for _ in 1..14 {
        h.watch
            .complete_season(archer, Some(h.alice), SeasonSnapshot::default())
            .await
            .unwrap();
    }
    assert_eq!(h.link(archer, h.alice).await, (WatchStatus::InProgress, 14));

    let changes = h
        .watch
        .complete_season(
            archer,
            Some(h.alice),
            SeasonSnapshot {
                current_season: Some(14),
                total_seasons: Some(14),
            },
        )
        .await
        .unwrap();

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].after.status, WatchStatus::Finished);
    assert_eq!(changes[0].after.current_season, 14);

    let finished_at = changes[0].after.finished_at.expect("finished_at set");
    assert!((chrono::Utc::now() - finished_at).num_seconds().abs() < 60);
}

#[tokio::test]
async fn test_complete_season_mid_show_advances() {
    let h = household().await;
    let dark = h.show("Dark", 3, vec![h.alice, h.bob]).await;

    let changes = h
        .watch
        .complete_season(dark, None, SeasonSnapshot::default())
        .await
        .unwrap();

    assert_eq!(changes.len(), 2);
    for change in &changes {
        assert_eq!(change.after.status, WatchStatus::InProgress);
        assert_eq!(change.after.current_season, 2);
        assert!(change.after.finished_at.is_none());
    }
}

#[tokio::test]
async fn test_group_completion_skips_finished_watchers() {
    let h = household().await;
    let dark = h.show("Dark", 3, vec![h.alice, h.bob]).await;
    h.watch
        .update_watcher_status(dark, h.alice, WatchStatus::Finished)
        .await
        .unwrap();
    h.watch
        .update_watcher_status(dark, h.bob, WatchStatus::InProgress)
        .await
        .unwrap();

    let board = h.shows.dashboard().await.unwrap();
    let card = &board.currently_watching.get("Bob").unwrap()[0];
    assert_eq!(card.current_season, 1);

    let changes = h
        .watch
        .complete_season(
            dark,
            None,
            SeasonSnapshot {
                current_season: Some(card.current_season),
                total_seasons: Some(card.total_seasons),
            },
        )
        .await
        .unwrap();

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].user_id, h.bob);
    assert_eq!(h.link(dark, h.bob).await, (WatchStatus::InProgress, 2));
    assert_eq!(h.link(dark, h.alice).await, (WatchStatus::Finished, 3));
}

#[tokio::test]
async fn test_group_start_watching_leaves_finished_watchers_alone() {
    let h = household().await;
    let dark = h.show("Dark", 3, vec![h.alice, h.bob]).await;
    h.watch
        .update_watcher_status(dark, h.alice, WatchStatus::Finished)
        .await
        .unwrap();

    let changes = h.watch.start_watching(dark, None).await.unwrap();

    assert_eq!(changes.len(), 1);
    assert_eq!(h.link(dark, h.bob).await, (WatchStatus::InProgress, 1));
    assert_eq!(h.link(dark, h.alice).await, (WatchStatus::Finished, 3));
}

#[tokio::test]
async fn test_group_action_with_everyone_finished_is_a_conflict() {
    let h = household().await;
    let archer = h.show("Archer", 2, vec![h.alice]).await;
    h.watch
        .update_watcher_status(archer, h.alice, WatchStatus::Finished)
        .await
        .unwrap();

    let result = h
        .watch
        .complete_season(archer, None, SeasonSnapshot::default())
        .await;
    assert!(matches!(result, Err(WatchError::Conflict(_))));
    assert_eq!(h.link(archer, h.alice).await, (WatchStatus::Finished, 2));
}

#[tokio::test]
async fn test_group_completion_echoes_the_card_season() {
    let h = household().await;
    let dark = h.show("Dark", 3, vec![h.alice, h.bob]).await;
    h.watch.start_watching(dark, None).await.unwrap();
    h.watch
        .complete_season(dark, Some(h.alice), SeasonSnapshot::default())
        .await
        .unwrap();

    let board = h.shows.dashboard().await.unwrap();
    let card = &board.currently_watching.get("Alice, Bob").unwrap()[0];
    assert_eq!(card.current_season, 1);

    let changes = h
        .watch
        .complete_season(
            dark,
            None,
            SeasonSnapshot {
                current_season: Some(card.current_season),
                total_seasons: Some(3),
            },
        )
        .await
        .unwrap();
    assert_eq!(changes.len(), 2);
    assert_eq!(h.link(dark, h.alice).await, (WatchStatus::InProgress, 3));
    assert_eq!(h.link(dark, h.bob).await, (WatchStatus::InProgress, 2));

    // The card now reads season 2; echoing the old value is stale
    let stale = h
        .watch
        .complete_season(
            dark,
            None,
            SeasonSnapshot {
                current_season: Some(1),
                total_seasons: Some(3),
            },
        )
        .await;
    assert!(matches!(stale, Err(WatchError::Conflict(_))));
    assert_eq!(h.link(dark, h.bob).await, (WatchStatus::InProgress, 2));
}

#[tokio::test]
async fn test_stale_completion_is_a_conflict_and_changes_nothing() {
    let h = household().await;
    let dark = h.show("Dark", 3, vec![h.alice]).await;
    h.watch.start_watching(dark, Some(h.alice)).await.unwrap();

    // First click advances 1 -> 2
    h.watch
        .complete_season(
            dark,
            Some(h.alice),
            SeasonSnapshot {
                current_season: Some(1),
                total_seasons: Some(3),
            },
        )
        .await
        .unwrap();

    // Replayed click still claims season 1
    let result = h
        .watch
        .complete_season(
            dark,
            Some(h.alice),
            SeasonSnapshot {
                current_season: Some(1),
                total_seasons: Some(3),
            },
        )
        .await;

    assert!(matches!(result, Err(WatchError::Conflict(_))));
    assert_eq!(h.link(dark, h.alice).await, (WatchStatus::InProgress, 2));
}

#[tokio::test]
async fn test_completing_a_finished_show_is_refused() {
    let h = household().await;
    let short = h.show("Chernobyl", 1, vec![h.alice]).await;

    h.watch
        .complete_season(short, Some(h.alice), SeasonSnapshot::default())
        .await
        .unwrap();
    let again = h
        .watch
        .complete_season(short, Some(h.alice), SeasonSnapshot::default())
        .await;

    assert!(matches!(again, Err(WatchError::Conflict(_))));
}

#[tokio::test]
async fn test_remove_season_at_one_is_a_no_op() {
    let h = household().await;
    let single = h.show("Chernobyl", 1, vec![h.alice]).await;

    let change = h.watch.remove_season(single, Some(1)).await.unwrap();

    assert!(!change.changed);
    assert_eq!(change.total_seasons, 1);
    assert_eq!(h.record(single).await.total_seasons, 1);
}

#[tokio::test]
async fn test_add_season_pulls_everyone_into_it() {
    let h = household().await;
    let show = h.show("Severance", 3, vec![h.alice, h.bob]).await;
    h.watch
        .update_watcher_status(show, h.alice, WatchStatus::Finished)
        .await
        .unwrap();

    let change = h.watch.add_season(show, Some(3)).await.unwrap();

    assert_eq!(change.total_seasons, 4);
    assert_eq!(change.links_updated, 2);
    assert_eq!(h.link(show, h.alice).await, (WatchStatus::InProgress, 4));
    assert_eq!(h.link(show, h.bob).await, (WatchStatus::InProgress, 4));
    let record = h.record(show).await;
    assert!(record.watchers.iter().all(|w| w.finished_at.is_none()));
}

#[tokio::test]
async fn test_remove_then_add_restores_total_at_new_max() {
    let h = household().await;
    let show = h.show("Severance", 3, vec![h.alice]).await;
    h.watch.start_watching(show, Some(h.alice)).await.unwrap();

    h.watch.remove_season(show, Some(3)).await.unwrap();
    h.watch.add_season(show, Some(2)).await.unwrap();

    assert_eq!(h.record(show).await.total_seasons, 3);
    assert_eq!(h.link(show, h.alice).await, (WatchStatus::InProgress, 3));
}

#[tokio::test]
async fn test_season_echo_mismatch_is_a_conflict() {
    let h = household().await;
    let show = h.show("Severance", 3, vec![h.alice]).await;

    let result = h.watch.add_season(show, Some(2)).await;

    assert!(matches!(result, Err(WatchError::Conflict(_))));
    assert_eq!(h.record(show).await.total_seasons, 3);
}

#[tokio::test]
async fn test_add_watcher_twice_keeps_one_link() {
    let h = household().await;
    let show = h.show("Dark", 3, vec![h.alice]).await;

    assert!(h.watch.add_watcher(show, h.bob, None).await.unwrap());
    assert!(!h.watch.add_watcher(show, h.bob, None).await.unwrap());

    let record = h.record(show).await;
    assert_eq!(record.watchers.iter().filter(|w| w.user_id == h.bob).count(), 1);
}

#[tokio::test]
async fn test_add_watcher_as_finished_sits_on_last_season() {
    let h = household().await;
    let show = h.show("Dark", 3, vec![h.alice]).await;

    h.watch
        .add_watcher(show, h.bob, Some(WatchStatus::Finished))
        .await
        .unwrap();

    let record = h.record(show).await;
    let bob = record.watchers.iter().find(|w| w.user_id == h.bob).unwrap();
    assert_eq!(bob.status, WatchStatus::Finished);
    assert_eq!(bob.current_season, 3);
    assert!(bob.finished_at.is_some());
}

#[tokio::test]
async fn test_show_with_progress_cannot_be_deleted() {
    let h = household().await;
    let show = h.show("Dark", 3, vec![h.alice]).await;
    h.watch
        .complete_season(show, Some(h.alice), SeasonSnapshot::default())
        .await
        .unwrap();

    let result = h.shows.delete_show(show).await;
    assert!(matches!(result, Err(ShowError::Refused(_))));
    assert!(h.store.get_show(show).await.unwrap().is_some());

    let moved = h.watch.move_to_want_to_watch(show).await;
    assert!(matches!(moved, Err(WatchError::Refused(_))));
}

#[tokio::test]
async fn test_untouched_show_moves_back_and_deletes() {
    let h = household().await;
    let show = h.show("Dark", 3, vec![h.alice, h.bob]).await;
    h.watch.start_watching(show, Some(h.alice)).await.unwrap();

    assert_eq!(h.watch.move_to_want_to_watch(show).await.unwrap(), 1);
    assert_eq!(h.link(show, h.alice).await, (WatchStatus::WantToWatch, 1));

    h.shows.delete_show(show).await.unwrap();
    assert!(h.store.get_show(show).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_user_and_platform_with_dependents_fails() {
    let h = household().await;
    h.show("Dark", 3, vec![h.alice]).await;

    let user = h.admin.delete_user(h.alice).await;
    assert!(matches!(user, Err(AdminError::InUse(ref msg)) if msg.contains("1 show(s)")));

    let platform = h.admin.delete_platform(h.platform).await;
    assert!(matches!(platform, Err(AdminError::InUse(_))));

    assert_eq!(h.admin.list_users().await.unwrap().len(), 2);
    assert_eq!(h.admin.list_platforms().await.unwrap().len(), 1);

    // Bob is attached to nothing
    h.admin.delete_user(h.bob).await.unwrap();
    assert_eq!(h.admin.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_duplicate_names_conflict() {
    let h = household().await;

    let result = h.admin.create_user("  Alice ").await;
    assert!(matches!(result, Err(AdminError::Conflict(_))));

    let blank = h.admin.create_platform("   ").await;
    assert!(matches!(blank, Err(AdminError::Validation(_))));
}

#[tokio::test]
async fn test_cancel_toggle_is_relative_to_what_was_seen() {
    let h = household().await;
    let show = h.show("Firefly", 1, vec![h.alice]).await;

    assert!(h.watch.toggle_cancelled(show, false).await.unwrap());
    // Replay of the same request
    assert!(h.watch.toggle_cancelled(show, false).await.unwrap());
    assert!(h.record(show).await.cancelled);

    assert!(!h.watch.toggle_cancelled(show, true).await.unwrap());
}

#[tokio::test]
async fn test_create_show_validation() {
    let h = household().await;

    let no_seasons = h
        .shows
        .create_show(CreateShow {
            name: "Dark".to_string(),
            total_seasons: 0,
            platform_id: h.platform,
            user_ids: vec![h.alice],
        })
        .await;
    assert!(matches!(no_seasons, Err(ShowError::Validation(_))));

    let unknown_platform = h
        .shows
        .create_show(CreateShow {
            name: "Dark".to_string(),
            total_seasons: 3,
            platform_id: PlatformId::new(999),
            user_ids: vec![h.alice],
        })
        .await;
    assert!(matches!(unknown_platform, Err(ShowError::NotFound(_))));
}

#[tokio::test]
async fn test_dashboard_and_finished_views() {
    let h = household().await;
    let dark = h.show("Dark", 3, vec![h.alice, h.bob]).await;
    let archer = h.show("Archer", 1, vec![h.bob]).await;

    h.watch.start_watching(dark, None).await.unwrap();
    h.watch
        .complete_season(archer, Some(h.bob), SeasonSnapshot::default())
        .await
        .unwrap();

    let board = h.shows.dashboard().await.unwrap();
    let group = board.currently_watching.get("Alice, Bob").unwrap();
    assert_eq!(group.len(), 1);
    assert_eq!(group[0].name, "Dark");
    assert!(board.want_to_watch.is_empty());

    let finished = h.shows.finished_shows("", "", 1).await.unwrap();
    assert_eq!(finished.total_items, 1);
    assert_eq!(finished.items[0].name, "Archer");

    let filtered = h.shows.finished_shows("", "hulu", 1).await.unwrap();
    assert_eq!(filtered.total_items, 0);
}

#[tokio::test]
async fn test_store_enforces_foreign_keys() {
    use sea_orm::{ActiveModelTrait, ActiveValue::Set};
    use showtracker::entities::shows_to_users;

    let h = household().await;
    let dark = h.show("Dark", 3, vec![h.alice]).await;

    let orphan = shows_to_users::ActiveModel {
        show_id: Set(dark.value()),
        user_id: Set(9999),
        status: Set(WatchStatus::WantToWatch),
        current_season: Set(1),
        finished_at: Set(None),
    };
    assert!(orphan.insert(&h.store.conn).await.is_err());
    assert_eq!(h.record(dark).await.watchers.len(), 1);
}
