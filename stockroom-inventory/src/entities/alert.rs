use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stockroom::collection::RecordId;
use stockroom_derive::Entity;

use crate::timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    LowStock,
    Overstock,
    Expiry,
    DemandSpike,
    SupplierDelay,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::LowStock => "low_stock",
            AlertType::Overstock => "overstock",
            AlertType::Expiry => "expiry",
            AlertType::DemandSpike => "demand_spike",
            AlertType::SupplierDelay => "supplier_delay",
        }
    }
}

impl Display for AlertType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// A notice raised for users, by the stock service or by callers.
#[derive(Entity, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[entity(collection = "alerts")]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    #[serde(default)]
    pub severity: Severity,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<RecordId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<RecordId>,
    #[serde(default)]
    pub action_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_action: Option<String>,
    /// Users the alert is addressed to; empty means everyone.
    #[serde(default)]
    pub affected_users: Vec<RecordId>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub is_resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<RecordId>,
    #[serde(default, with = "timestamp::optional", skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::optional", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::optional", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Alert {
    pub fn new(alert_type: AlertType, title: &str, message: &str) -> Self {
        Alert {
            id: None,
            alert_type,
            severity: Severity::default(),
            title: title.to_string(),
            message: message.to_string(),
            product_id: None,
            location_id: None,
            action_required: false,
            recommended_action: None,
            affected_users: Vec::new(),
            is_read: false,
            is_resolved: false,
            resolved_by: None,
            resolved_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn for_stock(mut self, product_id: RecordId, location_id: RecordId) -> Self {
        self.product_id = Some(product_id);
        self.location_id = Some(location_id);
        self
    }

    pub fn is_visible_to(&self, user: Option<&RecordId>) -> bool {
        match user {
            Some(user) => self.affected_users.is_empty() || self.affected_users.contains(user),
            None => true,
        }
    }
}
