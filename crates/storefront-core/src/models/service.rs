use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum ServiceType {
    Vitrine,
    Ecommerce,
    Saas,
    Coaching,
}

impl ServiceType {
    pub const ALL: [ServiceType; 4] = [
        ServiceType::Vitrine,
        ServiceType::Ecommerce,
        ServiceType::Saas,
        ServiceType::Coaching,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ServiceType::Vitrine => "Showcase website",
            ServiceType::Ecommerce => "E-commerce",
            ServiceType::Saas => "SaaS",
            ServiceType::Coaching => "Coaching",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Service {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub base_price: f64,
    #[serde(default)]
    pub image: String,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

/// Partial service edit. Unset fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<ServiceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_service() {
        let json = r#"{"id":"s1","name":"Site vitrine","description":"Five pages","basePrice":1200,"image":"/img/vitrine.png","type":"VITRINE","isActive":true,"features":["SEO","Responsive"]}"#;
        let service: Service = serde_json::from_str(json).unwrap();
        assert_eq!(service.service_type, ServiceType::Vitrine);
        assert_eq!(service.base_price, 1200.0);
        assert_eq!(service.features.len(), 2);
    }

    #[test]
    fn test_service_type_wire_names() {
        assert_eq!(serde_json::to_string(&ServiceType::Ecommerce).unwrap(), "\"ECOMMERCE\"");
        assert_eq!(serde_json::to_string(&ServiceType::Saas).unwrap(), "\"SAAS\"");
    }
}
