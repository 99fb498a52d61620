//! Dashboard printout for the terminal.

use std::collections::BTreeMap;

use crate::config::Config;
use crate::db::Store;
use crate::domain::views::{self, DashboardShow};

pub async fn cmd_list_dashboard(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let dashboard = views::dashboard(&store.list_show_records().await?);

    if dashboard.currently_watching.is_empty() && dashboard.want_to_watch.is_empty() {
        println!("Nothing on the board yet.");
        return Ok(());
    }

    print_section("Currently watching", &dashboard.currently_watching, true);
    print_section("Want to watch", &dashboard.want_to_watch, false);

    Ok(())
}

fn print_section(title: &str, groups: &BTreeMap<String, Vec<DashboardShow>>, progress: bool) {
    if groups.is_empty() {
        return;
    }

    println!("{title}");
    println!("{:-<70}", "");

    for (watchers, shows) in groups {
        println!("{watchers}");
        for show in shows {
            if progress {
                println!(
                    "  • {} [{}/{}] on {}",
                    show.name, show.current_season, show.total_seasons, show.platform_name
                );
            } else {
                println!(
                    "  • {} ({} seasons) on {}",
                    show.name, show.total_seasons, show.platform_name
                );
            }
        }
    }

    println!();
}
