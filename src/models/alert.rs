use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::relief::ReliefItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
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

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(anyhow::anyhow!("unknown severity '{}'", other)),
        }
    }
}

/// Lifecycle of an alert row. Anything the backend reports that is not
/// `active` is read as `Inactive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    #[serde(other)]
    Inactive,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Inactive => "inactive",
        }
    }

    pub fn parse_lenient(s: Option<&str>) -> Option<Self> {
        s.map(|s| match s {
            "active" => AlertStatus::Active,
            _ => AlertStatus::Inactive,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub severity: Severity,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub needed_relief: Vec<String>,
    #[serde(default)]
    pub status: Option<AlertStatus>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub contact_info: Option<String>,
    #[serde(default)]
    pub additional_notes: Option<String>,
}

impl Alert {
    pub fn is_active(&self) -> bool {
        self.status == Some(AlertStatus::Active)
    }
}

/// Composite location as entered on the create form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationInput {
    pub district: String,
    pub municipality: String,
    pub ward: String,
    pub specific_location: String,
}

impl LocationInput {
    /// Flattens the parts into the single display string that gets stored.
    pub fn flatten(&self) -> String {
        format!(
            "{}, {}, Ward {}, {}",
            self.district, self.municipality, self.ward, self.specific_location
        )
    }
}

/// A row ready to be inserted; the backend assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewAlert {
    pub title: String,
    pub description: String,
    pub location: String,
    pub severity: Severity,
    pub image_url: Option<String>,
    pub needed_relief: Vec<String>,
    pub created_by: Uuid,
    pub contact_info: Option<String>,
    pub additional_notes: Option<String>,
}

/// Badge shown on a card, derived from severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    High,
    Medium,
    Low,
}

impl From<Severity> for Urgency {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Critical => Urgency::High,
            Severity::High => Urgency::Medium,
            Severity::Medium | Severity::Low => Urgency::Low,
        }
    }
}

/// Display form of an alert as the feed renders it.
#[derive(Debug, Clone, Serialize)]
pub struct AlertCard {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub severity: Severity,
    pub urgency: Urgency,
    pub timestamp: DateTime<Utc>,
    pub image_url: Option<String>,
    pub needed_relief: Vec<ReliefItem>,
    pub created_by: Uuid,
}

impl From<&Alert> for AlertCard {
    fn from(alert: &Alert) -> Self {
        Self {
            id: alert.id,
            title: alert.title.clone(),
            description: alert.description.clone(),
            location: alert.location.clone(),
            severity: alert.severity,
            urgency: alert.severity.into(),
            timestamp: alert.created_at,
            image_url: alert.image_url.clone(),
            needed_relief: alert
                .needed_relief
                .iter()
                .map(|raw| ReliefItem::parse(raw))
                .collect(),
            created_by: alert.created_by,
        }
    }
}
