use serde_json::Value;
use tracing::info;

use super::envelope::decode_keyed;
use crate::auth::SessionClient;
use crate::error::SessionError;
use crate::models::{Service, ServiceUpdate};

/// Service catalogue. Reads are public; writes require an admin session.
#[derive(Clone)]
pub struct ServiceApi {
    session: SessionClient,
}

impl ServiceApi {
    pub fn new(session: SessionClient) -> Self {
        Self { session }
    }

    pub async fn list(&self) -> Result<Vec<Service>, SessionError> {
        self.session
            .get_json("/services", "Failed to fetch services")
            .await
    }

    /// Only services currently offered for sale
    pub async fn list_active(&self) -> Result<Vec<Service>, SessionError> {
        let services = self.list().await?;
        Ok(services.into_iter().filter(|s| s.is_active).collect())
    }

    pub async fn get(&self, id: &str) -> Result<Service, SessionError> {
        let data: Value = self
            .session
            .get_json(&format!("/services/{}", id), "Failed to fetch service")
            .await?;
        decode_keyed(data, "service")
    }

    pub async fn create(&self, service: &Service) -> Result<Service, SessionError> {
        let created: Service = self
            .session
            .post_json("/services", service, "Failed to create service")
            .await?;
        info!(id = ?created.id, name = %created.name, "Created service");
        Ok(created)
    }

    pub async fn update(&self, id: &str, update: &ServiceUpdate) -> Result<Service, SessionError> {
        self.session
            .put_json(&format!("/services/{}", id), update, "Failed to update service")
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), SessionError> {
        self.session
            .delete_json(&format!("/services/{}", id), "Failed to delete service")
            .await?;
        info!(id = id, "Deleted service");
        Ok(())
    }
}
