use async_trait::async_trait;
use tracing::instrument;

use super::RestBackend;
use crate::{error::StoreError, models::Profile, ports::ProfileStore};

#[async_trait]
impl ProfileStore for RestBackend {
    #[instrument(skip(self))]
    async fn profile(&self, identity_id: &str) -> Result<Option<Profile>, StoreError> {
        let rows: Vec<Profile> = self
            .rows(
                "profiles",
                &[
                    ("id", format!("eq.{identity_id}")),
                    ("select", "name,bio".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }
}
