use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::ApiConfig;
use crate::permissions::model::{AccountId, Menu, MenuId, PermissionGrant};
use crate::store::wire::{BulkUpsertRequest, BulkUpsertSummary, Envelope, GrantRecord, MenuGrantRecords};
use crate::store::{BulkUpsertOutcome, GrantStore, MenuCatalog, StoreError};

/// Menu catalog and grant store reached over the admin REST API
#[derive(Debug, Clone)]
pub struct HttpAdminApi {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpAdminApi {
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self, StoreError> {
        // Keep a trailing slash so relative joins stay under any path prefix
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self { base_url, http })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, StoreError> {
        Self::new(
            &config.base_url,
            Duration::from_millis(config.request_timeout_ms),
            &config.user_agent,
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        Ok(self.base_url.join(path)?)
    }

    /// Unwrap the response envelope, turning HTTP and envelope failures into errors
    async fn read_envelope<T>(response: reqwest::Response) -> Result<Option<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        let body = response.text().await?;

        let envelope: Envelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(StoreError::Status {
                    status: status.as_u16(),
                    message: body,
                })
            }
            Err(e) => return Err(StoreError::Decode(e)),
        };

        if !status.is_success() || !envelope.success {
            return Err(StoreError::Status {
                status: status.as_u16(),
                message: envelope.error_message().unwrap_or("request failed").to_string(),
            });
        }

        Ok(envelope.data)
    }
}

#[async_trait]
impl MenuCatalog for HttpAdminApi {
    async fn list_menus(&self) -> Result<Vec<Menu>, StoreError> {
        let url = self.endpoint("api/menus")?;
        debug!("GET {}", url);
        let response = self.http.get(url).send().await?;
        Ok(Self::read_envelope::<Vec<Menu>>(response).await?.unwrap_or_default())
    }
}

#[async_trait]
impl GrantStore for HttpAdminApi {
    async fn list_grants(&self, menu_id: MenuId, account_id: AccountId) -> Result<Vec<PermissionGrant>, StoreError> {
        let url = self.endpoint("api/permissions")?;
        debug!("GET {} menu_id={} account_id={}", url, menu_id, account_id);
        let response = self
            .http
            .get(url)
            .query(&[("menu_id", menu_id.0), ("account_id", account_id.0)])
            .send()
            .await?;

        let records = Self::read_envelope::<Vec<GrantRecord>>(response).await?.unwrap_or_default();
        let grants = records
            .into_iter()
            .filter_map(|record| {
                let code = record.permission_code;
                let grant = record.into_grant();
                if grant.is_none() {
                    debug!("Skipping grant with unknown permission code {}", code);
                }
                grant
            })
            .collect();
        Ok(grants)
    }

    async fn bulk_upsert(
        &self,
        account_id: AccountId,
        menus: Vec<MenuGrantRecords>,
    ) -> Result<BulkUpsertOutcome, StoreError> {
        let url = self.endpoint(&format!("api/accounts/{}/permissions", account_id))?;
        debug!("POST {} ({} menus)", url, menus.len());
        let response = self.http.post(url).json(&BulkUpsertRequest { menus }).send().await?;

        let summary = Self::read_envelope::<BulkUpsertSummary>(response).await?.unwrap_or_default();
        // The endpoint does not echo written rows, so identifiers come from a re-read.
        Ok(BulkUpsertOutcome {
            saved: summary.saved,
            assigned: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_stay_under_base_path() {
        let api = HttpAdminApi::new("http://admin.example.com/console", Duration::from_secs(5), "test").unwrap();
        assert_eq!(api.endpoint("api/menus").unwrap().as_str(), "http://admin.example.com/console/api/menus");

        let api = HttpAdminApi::new("http://localhost:8080/", Duration::from_secs(5), "test").unwrap();
        assert_eq!(api.endpoint("api/accounts/42/permissions").unwrap().as_str(), "http://localhost:8080/api/accounts/42/permissions");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpAdminApi::new("not a url", Duration::from_secs(5), "test"),
            Err(StoreError::InvalidUrl(_))
        ));
    }
}
