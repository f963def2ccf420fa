use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

use eduadmin_permissions::permissions::{
    AccountId, BulkSaveCoordinator, GrantId, InitializerSettings, Menu, MenuId, PermissionGrant, PermissionKind,
};
use eduadmin_permissions::server;
use eduadmin_permissions::store::http::HttpAdminApi;
use eduadmin_permissions::store::memory::MemoryStore;

pub struct TestServer {
    pub base_url: String,
    pub store: Arc<MemoryStore>,
}

impl TestServer {
    /// Serve `store` on an unused port inside the current test runtime
    pub async fn spawn(store: MemoryStore) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test server")?;
        let store = Arc::new(store);
        tokio::spawn(server::serve(listener, store.clone()));

        let server = Self { base_url, store };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn api(&self) -> Result<Arc<HttpAdminApi>> {
        Ok(Arc::new(HttpAdminApi::new(&self.base_url, Duration::from_secs(5), "eduadmin-tests")?))
    }

    pub fn coordinator(&self) -> Result<Arc<BulkSaveCoordinator>> {
        let api = self.api()?;
        Ok(Arc::new(BulkSaveCoordinator::new(
            api.clone(),
            api,
            InitializerSettings {
                fetch_timeout: Duration::from_millis(500),
                max_concurrent_fetches: 4,
            },
        )))
    }
}

/// Account 42 with menus Users and Courses and one saved Read grant on Users
pub fn scenario_store() -> MemoryStore {
    let read = PermissionGrant {
        account_id: AccountId(42),
        menu_id: MenuId(1),
        kind: PermissionKind::Read,
        status: true,
        persisted_id: Some(GrantId::from("g-9")),
    };
    MemoryStore::new(vec![Menu::new(1, "Users"), Menu::new(2, "Courses")]).with_grants(vec![read])
}
