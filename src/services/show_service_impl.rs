//! `SeaORM` implementation of the `ShowService` trait.

use async_trait::async_trait;

use crate::db::{NewShow, Outcome, Store};
use crate::domain::views::{self, Dashboard, FinishedRow, ManageRow, Page};
use crate::domain::{ShowId, normalize_name, validate_total_seasons};
use crate::services::show_service::{CreateShow, ShowDetail, ShowError, ShowService};

pub struct SeaOrmShowService {
    store: Store,
    page_size: u64,
}

impl SeaOrmShowService {
    #[must_use]
    pub const fn new(store: Store, page_size: u64) -> Self {
        Self { store, page_size }
    }
}

fn settle<T>(outcome: Outcome<T>) -> Result<T, ShowError> {
    match outcome {
        Outcome::Applied(value) => Ok(value),
        Outcome::Missing(what) => Err(ShowError::NotFound(what.to_string())),
        Outcome::Rejected(err) => Err(ShowError::Refused(format!(
            "Cannot delete show: {err}"
        ))),
        Outcome::Stale | Outcome::Duplicate | Outcome::InUse(_) => Err(ShowError::Internal(
            "Unexpected outcome for a show change".to_string(),
        )),
    }
}

#[async_trait]
impl ShowService for SeaOrmShowService {
    async fn create_show(&self, input: CreateShow) -> Result<ShowId, ShowError> {
        let name = normalize_name("Show", &input.name).map_err(ShowError::Validation)?;
        let total_seasons =
            validate_total_seasons(input.total_seasons).map_err(ShowError::Validation)?;
        if input.user_ids.is_empty() {
            return Err(ShowError::Validation(
                "At least one watcher is required".to_string(),
            ));
        }

        let show = NewShow {
            name,
            total_seasons,
            platform_id: input.platform_id,
            user_ids: input.user_ids,
        };

        settle(self.store.create_show(&show).await?)
    }

    async fn get_show(&self, id: ShowId) -> Result<ShowDetail, ShowError> {
        let show = self
            .store
            .get_show(id)
            .await?
            .ok_or_else(|| ShowError::NotFound("Show".to_string()))?;

        let all_users = self.store.list_users().await?;

        Ok(ShowDetail { show, all_users })
    }

    async fn rename_show(&self, id: ShowId, name: &str) -> Result<(), ShowError> {
        let name = normalize_name("Show", name).map_err(ShowError::Validation)?;

        if self.store.rename_show(id, &name).await? {
            Ok(())
        } else {
            Err(ShowError::NotFound("Show".to_string()))
        }
    }

    async fn delete_show(&self, id: ShowId) -> Result<(), ShowError> {
        settle(self.store.delete_show(id).await?)
    }

    async fn dashboard(&self) -> Result<Dashboard, ShowError> {
        let records = self.store.list_show_records().await?;
        Ok(views::dashboard(&records))
    }

    async fn manage_shows(&self, search: &str, page: u64) -> Result<Page<ManageRow>, ShowError> {
        let records = self.store.list_show_records().await?;
        Ok(views::manage(&records, search, page, self.page_size))
    }

    async fn finished_shows(
        &self,
        show_name: &str,
        platform: &str,
        page: u64,
    ) -> Result<Page<FinishedRow>, ShowError> {
        let records = self.store.list_show_records().await?;
        Ok(views::finished(
            &records,
            show_name,
            platform,
            page,
            self.page_size,
        ))
    }
}
