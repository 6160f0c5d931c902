use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use serde_json::json;
use tracing::info;

use crate::{
    backend::BackendClient,
    config::{PortalConfig, SeedAdmin},
    store::{AuthProvider, Filter, PgStore, RecordStore, SelectQuery},
    web::models::{ADMIN_ROLE, PROFILES_TABLE},
};

/// Per-process handles shared by every request. Holds no request data.
#[derive(Clone)]
pub struct AppState {
    auth: Arc<dyn AuthProvider>,
    records: Arc<dyn RecordStore>,
    backend: BackendClient,
}

impl AppState {
    pub async fn new(config: &PortalConfig) -> Result<Self> {
        let store = Arc::new(PgStore::connect(&config.database_url).await?);
        let backend = BackendClient::new(config.backend_origin.clone(), config.backend_timeout)?;

        Ok(Self::from_parts(store.clone(), store, backend))
    }

    pub fn from_parts(
        auth: Arc<dyn AuthProvider>,
        records: Arc<dyn RecordStore>,
        backend: BackendClient,
    ) -> Self {
        Self {
            auth,
            records,
            backend,
        }
    }

    pub async fn ensure_seed_admin(&self, seed: &SeedAdmin) -> Result<()> {
        let admins = self
            .records
            .select(
                &SelectQuery::from(PROFILES_TABLE).filter(Filter::eq("role", ADMIN_ROLE)),
            )
            .await
            .context("failed to verify admin presence")?;

        if !admins.is_empty() {
            return Ok(());
        }

        let existing = self
            .auth
            .credentials_for(&seed.username)
            .await
            .context("failed to look up seed admin user")?;

        // A user left behind by an interrupted seed only needs its profile.
        let user_id = match existing {
            Some(credentials) => credentials.user_id,
            None => {
                let password_hash = crate::web::auth::hash_password(&seed.password)
                    .map_err(|err| anyhow!("failed to hash seed admin password: {err}"))?;

                self.auth
                    .create_user(&seed.username, &password_hash)
                    .await
                    .context("failed to insert seed admin user")?
            }
        };

        self.records
            .insert(
                PROFILES_TABLE,
                json!({
                    "user_id": user_id.to_string(),
                    "role": ADMIN_ROLE,
                    "display_name": seed.username,
                }),
            )
            .await
            .context("failed to insert seed admin profile")?;

        info!(
            username = %seed.username,
            "Seeded default admin user. Update its password promptly."
        );

        Ok(())
    }

    pub fn auth(&self) -> &dyn AuthProvider {
        self.auth.as_ref()
    }

    pub fn records(&self) -> &dyn RecordStore {
        self.records.as_ref()
    }

    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }
}
