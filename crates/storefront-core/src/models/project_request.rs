use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum ProjectRequestStatus {
    #[default]
    Pending,
    Quoted,
    Accepted,
    Rejected,
    Archived,
}

impl ProjectRequestStatus {
    /// Wire value, as used in the admin list `status` filter
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRequestStatus::Pending => "PENDING",
            ProjectRequestStatus::Quoted => "QUOTED",
            ProjectRequestStatus::Accepted => "ACCEPTED",
            ProjectRequestStatus::Rejected => "REJECTED",
            ProjectRequestStatus::Archived => "ARCHIVED",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProjectRequestStatus::Pending => "Pending",
            ProjectRequestStatus::Quoted => "Quoted",
            ProjectRequestStatus::Accepted => "Accepted",
            ProjectRequestStatus::Rejected => "Rejected",
            ProjectRequestStatus::Archived => "Archived",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct RequestedService {
    pub service_id: String,
    pub service_name: String,
    pub quantity: u32,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ProjectRequest {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default)]
    pub requested_services: Vec<RequestedService>,
    pub estimated_total: f64,
    pub project_description: String,
    pub desired_deadline: String,
    #[serde(default)]
    pub has_existing_site: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_site_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
    pub status: ProjectRequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body of `POST /project-requests`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NewProjectRequest {
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub requested_services: Vec<RequestedService>,
    pub estimated_total: f64,
    pub project_description: String,
    pub desired_deadline: String,
    pub has_existing_site: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_site_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
}

impl NewProjectRequest {
    /// Sum of the requested lines, for `estimated_total`
    pub fn compute_estimate(services: &[RequestedService]) -> f64 {
        services.iter().map(|s| s.price * s.quantity as f64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_estimate() {
        let services = vec![
            RequestedService {
                service_id: "s1".into(),
                service_name: "Site vitrine".into(),
                quantity: 2,
                price: 500.0,
            },
            RequestedService {
                service_id: "s2".into(),
                service_name: "Coaching".into(),
                quantity: 1,
                price: 150.0,
            },
        ];
        assert_eq!(NewProjectRequest::compute_estimate(&services), 1150.0);
        assert_eq!(NewProjectRequest::compute_estimate(&[]), 0.0);
    }

    #[test]
    fn test_status_wire_value_matches_serde() {
        for status in [
            ProjectRequestStatus::Pending,
            ProjectRequestStatus::Quoted,
            ProjectRequestStatus::Accepted,
            ProjectRequestStatus::Rejected,
            ProjectRequestStatus::Archived,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }
}
