//! Read-side projections: dashboard groups and the paginated manage/finished lists.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::{PlatformId, ShowId, UserId};
use crate::entities::WatchStatus;

/// One watcher attached to a show.
#[derive(Debug, Clone, Serialize)]
pub struct WatcherRecord {
    pub user_id: UserId,
    pub name: String,
    pub status: WatchStatus,
    pub current_season: i32,
    pub finished_at: Option<DateTime<Utc>>,
}

/// A show with its platform and every watch link, as loaded from storage.
#[derive(Debug, Clone, Serialize)]
pub struct ShowRecord {
    pub id: ShowId,
    pub name: String,
    pub total_seasons: i32,
    pub platform_id: PlatformId,
    pub platform_name: String,
    pub cancelled: bool,
    pub watchers: Vec<WatcherRecord>,
}

impl ShowRecord {
    #[must_use]
    pub fn has_watched_seasons(&self) -> bool {
        self.watchers
            .iter()
            .any(|w| w.current_season > 1 || w.status == WatchStatus::Finished)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardShow {
    pub id: ShowId,
    pub name: String,
    pub total_seasons: i32,
    /// Season of the slowest active watcher.
    pub current_season: i32,
    pub platform_name: String,
    pub watchers: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Dashboard {
    pub currently_watching: BTreeMap<String, Vec<DashboardShow>>,
    pub want_to_watch: BTreeMap<String, Vec<DashboardShow>>,
}

/// Key shared by every show watched by exactly the same people.
#[must_use]
pub fn watcher_group_key<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let mut names: Vec<&str> = names.into_iter().collect();
    names.sort_unstable();
    names.join(", ")
}

fn by_name(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// Groups active shows by the set of people watching them.
///
/// A show with both in-progress and wishlisted watchers lands in both maps
/// under the same group key.
#[must_use]
pub fn dashboard(shows: &[ShowRecord]) -> Dashboard {
    let mut board = Dashboard::default();

    for show in shows {
        let active: Vec<&WatcherRecord> =
            show.watchers.iter().filter(|w| w.status.is_active()).collect();
        let Some(current_season) = active.iter().map(|w| w.current_season).min() else {
            continue;
        };

        let key = watcher_group_key(active.iter().map(|w| w.name.as_str()));
        let mut watchers: Vec<String> = active.iter().map(|w| w.name.clone()).collect();
        watchers.sort();

        let card = DashboardShow {
            id: show.id,
            name: show.name.clone(),
            total_seasons: show.total_seasons,
            current_season,
            platform_name: show.platform_name.clone(),
            watchers,
        };

        if active.iter().any(|w| w.status == WatchStatus::InProgress) {
            push_unique(board.currently_watching.entry(key.clone()).or_default(), &card);
        }
        if active.iter().any(|w| w.status == WatchStatus::WantToWatch) {
            push_unique(board.want_to_watch.entry(key).or_default(), &card);
        }
    }

    for group in board
        .currently_watching
        .values_mut()
        .chain(board.want_to_watch.values_mut())
    {
        group.sort_by(|a, b| by_name(&a.name, &b.name));
    }

    board
}

fn push_unique(group: &mut Vec<DashboardShow>, card: &DashboardShow) {
    if !group.iter().any(|s| s.id == card.id) {
        group.push(card.clone());
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

/// Slices an already filtered and sorted list. Pages start at 1; page 0 is
/// treated as 1 and pages past the end come back empty.
#[must_use]
pub fn paginate<T>(items: Vec<T>, page: u64, page_size: u64) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total_items = items.len() as u64;
    let total_pages = total_items.div_ceil(page_size);

    let skip = usize::try_from((page - 1).saturating_mul(page_size)).unwrap_or(usize::MAX);
    let take = usize::try_from(page_size).unwrap_or(usize::MAX);

    Page {
        items: items.into_iter().skip(skip).take(take).collect(),
        page,
        page_size,
        total_items,
        total_pages,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ManageWatcher {
    pub user_id: UserId,
    pub name: String,
    pub status: WatchStatus,
    pub current_season: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManageRow {
    pub id: ShowId,
    pub name: String,
    pub total_seasons: i32,
    pub platform_name: String,
    pub cancelled: bool,
    pub watchers: Vec<ManageWatcher>,
    pub has_watched_seasons: bool,
    pub can_delete: bool,
    pub can_move_to_want_to_watch: bool,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Every show, filtered by a case-insensitive name search.
#[must_use]
pub fn manage(shows: &[ShowRecord], search: &str, page: u64, page_size: u64) -> Page<ManageRow> {
    let search = search.trim();
    let mut rows: Vec<ManageRow> = shows
        .iter()
        .filter(|show| contains_ignore_case(&show.name, search))
        .map(|show| {
            let has_watched_seasons = show.has_watched_seasons();
            let has_in_progress = show
                .watchers
                .iter()
                .any(|w| w.status == WatchStatus::InProgress);

            ManageRow {
                id: show.id,
                name: show.name.clone(),
                total_seasons: show.total_seasons,
                platform_name: show.platform_name.clone(),
                cancelled: show.cancelled,
                watchers: show
                    .watchers
                    .iter()
                    .map(|w| ManageWatcher {
                        user_id: w.user_id,
                        name: w.name.clone(),
                        status: w.status,
                        current_season: w.current_season,
                    })
                    .collect(),
                has_watched_seasons,
                can_delete: !has_watched_seasons,
                can_move_to_want_to_watch: has_in_progress && !has_watched_seasons,
            }
        })
        .collect();

    rows.sort_by(|a, b| by_name(&a.name, &b.name));
    paginate(rows, page, page_size)
}

#[derive(Debug, Clone, Serialize)]
pub struct FinishedRow {
    pub id: ShowId,
    pub name: String,
    pub total_seasons: i32,
    pub platform_name: String,
    pub cancelled: bool,
    pub watchers: Vec<String>,
    /// Most recent finish among the watchers.
    pub finished_at: Option<DateTime<Utc>>,
}

/// Shows at least one person has finished.
#[must_use]
pub fn finished(
    shows: &[ShowRecord],
    show_name: &str,
    platform: &str,
    page: u64,
    page_size: u64,
) -> Page<FinishedRow> {
    let show_name = show_name.trim();
    let platform = platform.trim();

    let mut rows: Vec<FinishedRow> = shows
        .iter()
        .filter(|show| contains_ignore_case(&show.name, show_name))
        .filter(|show| contains_ignore_case(&show.platform_name, platform))
        .filter_map(|show| {
            let done: Vec<&WatcherRecord> = show
                .watchers
                .iter()
                .filter(|w| w.status == WatchStatus::Finished)
                .collect();
            if done.is_empty() {
                return None;
            }

            let mut watchers: Vec<String> = done.iter().map(|w| w.name.clone()).collect();
            watchers.sort();

            Some(FinishedRow {
                id: show.id,
                name: show.name.clone(),
                total_seasons: show.total_seasons,
                platform_name: show.platform_name.clone(),
                cancelled: show.cancelled,
                watchers,
                finished_at: done.iter().filter_map(|w| w.finished_at).max(),
            })
        })
        .collect();

    rows.sort_by(|a, b| by_name(&a.name, &b.name));
    paginate(rows, page, page_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn watcher(id: i32, name: &str, status: WatchStatus, season: i32) -> WatcherRecord {
        WatcherRecord {
            user_id: UserId::new(id),
            name: name.to_string(),
            status,
            current_season: season,
            finished_at: None,
        }
    }

    fn show(id: i32, name: &str, platform: &str, watchers: Vec<WatcherRecord>) -> ShowRecord {
        ShowRecord {
            id: ShowId::new(id),
            name: name.to_string(),
            total_seasons: 5,
            platform_id: PlatformId::new(1),
            platform_name: platform.to_string(),
            cancelled: false,
            watchers,
        }
    }

    #[test]
    fn test_group_key_is_sorted_and_comma_joined() {
        assert_eq!(watcher_group_key(["Sam", "Alex", "Jo"]), "Alex, Jo, Sam");
        assert_eq!(watcher_group_key(["Alex"]), "Alex");
        assert_eq!(watcher_group_key(Vec::<&str>::new()), "");
    }

    #[test]
    fn test_dashboard_groups_by_watchers() {
        let shows = vec![
            show(
                1,
                "Severance",
                "Apple TV",
                vec![
                    watcher(2, "Sam", WatchStatus::InProgress, 2),
                    watcher(1, "Alex", WatchStatus::InProgress, 1),
                ],
            ),
            show(
                2,
                "Andor",
                "Disney+",
                vec![
                    watcher(1, "Alex", WatchStatus::InProgress, 1),
                    watcher(2, "Sam", WatchStatus::InProgress, 1),
                ],
            ),
            show(3, "Dark", "Netflix", vec![watcher(1, "Alex", WatchStatus::WantToWatch, 1)]),
            show(4, "Done", "Netflix", vec![watcher(1, "Alex", WatchStatus::Finished, 5)]),
        ];

        let board = dashboard(&shows);

        let pair = &board.currently_watching["Alex, Sam"];
        let names: Vec<&str> = pair.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Andor", "Severance"]);
        assert_eq!(pair[1].current_season, 1);

        assert_eq!(board.want_to_watch["Alex"].len(), 1);
        assert!(!board.currently_watching.contains_key("Alex"));
        assert!(
            board
                .currently_watching
                .values()
                .chain(board.want_to_watch.values())
                .flatten()
                .all(|s| s.name != "Done")
        );
    }

    #[test]
    fn test_dashboard_mixed_statuses_appear_in_both_maps() {
        let shows = vec![show(
            1,
            "Shogun",
            "Hulu",
            vec![
                watcher(1, "Alex", WatchStatus::InProgress, 1),
                watcher(2, "Sam", WatchStatus::WantToWatch, 1),
            ],
        )];

        let board = dashboard(&shows);
        assert_eq!(board.currently_watching["Alex, Sam"].len(), 1);
        assert_eq!(board.want_to_watch["Alex, Sam"].len(), 1);
    }

    #[test]
    fn test_paginate() {
        let page = paginate((1..=32).collect::<Vec<_>>(), 3, 15);
        assert_eq!(page.items, vec![31, 32]);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_items, 32);

        let first = paginate(vec![1, 2, 3], 0, 15);
        assert_eq!(first.page, 1);
        assert_eq!(first.items, vec![1, 2, 3]);

        let past_end = paginate(vec![1, 2, 3], 9, 2);
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total_pages, 2);

        let empty = paginate(Vec::<i32>::new(), 1, 15);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_manage_flags_and_search() {
        let shows = vec![
            show(1, "The Bear", "Hulu", vec![watcher(1, "Alex", WatchStatus::InProgress, 1)]),
            show(2, "bluey", "Disney+", vec![watcher(1, "Alex", WatchStatus::InProgress, 3)]),
            show(3, "Arcane", "Netflix", vec![]),
        ];

        let all = manage(&shows, "", 1, 15);
        let names: Vec<&str> = all.items.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Arcane", "bluey", "The Bear"]);

        let bear = all.items.iter().find(|r| r.name == "The Bear").unwrap();
        assert!(bear.can_delete);
        assert!(bear.can_move_to_want_to_watch);

        let bluey = all.items.iter().find(|r| r.name == "bluey").unwrap();
        assert!(bluey.has_watched_seasons);
        assert!(!bluey.can_delete);
        assert!(!bluey.can_move_to_want_to_watch);

        let arcane = all.items.iter().find(|r| r.name == "Arcane").unwrap();
        assert!(arcane.can_delete);
        assert!(!arcane.can_move_to_want_to_watch);

        let searched = manage(&shows, "  BE ", 1, 15);
        assert_eq!(searched.items.len(), 1);
        assert_eq!(searched.items[0].name, "The Bear");
    }

    #[test]
    fn test_finished_filters_and_latest_date() {
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();

        let mut alex = watcher(1, "Alex", WatchStatus::Finished, 5);
        alex.finished_at = Some(early);
        let mut sam = watcher(2, "Sam", WatchStatus::Finished, 5);
        sam.finished_at = Some(late);

        let shows = vec![
            show(1, "Archer", "Hulu", vec![alex, sam]),
            show(2, "Ozark", "Netflix", vec![watcher(1, "Alex", WatchStatus::InProgress, 2)]),
        ];

        let page = finished(&shows, "", "", 1, 15);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].watchers, vec!["Alex", "Sam"]);
        assert_eq!(page.items[0].finished_at, Some(late));

        assert_eq!(finished(&shows, "arch", "hulu", 1, 15).items.len(), 1);
        assert!(finished(&shows, "", "netflix", 1, 15).items.is_empty());
    }
}
