use serde_json::{json, Value};
use tracing::info;

use super::envelope::decode_keyed;
use super::ApiRequest;
use crate::auth::SessionClient;
use crate::error::SessionError;
use crate::models::{NewProjectRequest, ProjectRequest, ProjectRequestStatus};

/// Quote requests. Creating and viewing one is public; when the visitor is
/// logged in their token goes along so the server can attach an order.
#[derive(Clone)]
pub struct ProjectRequestApi {
    session: SessionClient,
}

impl ProjectRequestApi {
    pub fn new(session: SessionClient) -> Self {
        Self { session }
    }

    pub async fn create(&self, request: &NewProjectRequest) -> Result<ProjectRequest, SessionError> {
        let data: Value = self
            .session
            .post_json("/project-requests", request, "Failed to submit project request")
            .await?;
        let created: ProjectRequest = decode_keyed(data, "projectRequest")?;
        info!(id = %created.id, order_id = ?created.order_id, "Submitted project request");
        Ok(created)
    }

    pub async fn get(&self, id: &str) -> Result<ProjectRequest, SessionError> {
        let data: Value = self
            .session
            .get_json(&format!("/project-requests/{}", id), "Project request not found")
            .await?;
        decode_keyed(data, "projectRequest")
    }

    /// All requests, optionally filtered by status (admin)
    pub async fn list(
        &self,
        status: Option<ProjectRequestStatus>,
    ) -> Result<Vec<ProjectRequest>, SessionError> {
        let mut request = ApiRequest::get("/admin/project-requests");
        if let Some(status) = status {
            request = request.query("status", status.as_str());
        }
        self.session
            .request_json(request, "Failed to load project requests")
            .await
    }

    pub async fn update_status(
        &self,
        id: &str,
        status: ProjectRequestStatus,
    ) -> Result<ProjectRequest, SessionError> {
        let data: Value = self
            .session
            .patch_json(
                &format!("/admin/project-requests/{}", id),
                &json!({ "status": status }),
                "Failed to update project request",
            )
            .await?;
        decode_keyed(data, "projectRequest")
    }
}
