use serde::{Deserialize, Serialize};

pub const DEFAULT_QUANTITY: &str = "Not specified";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReliefPriority {
    High,
    #[default]
    Medium,
    Low,
}

/// One entry of an alert's `needed_relief`, as displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReliefItem {
    pub item: String,
    pub priority: ReliefPriority,
    pub quantity: String,
}

/// Relief entry as submitted on the create form; quantity may be left empty.
#[derive(Debug, Clone, Deserialize)]
pub struct ReliefItemInput {
    pub item: String,
    #[serde(default)]
    pub priority: ReliefPriority,
    #[serde(default)]
    pub quantity: Option<String>,
}

#[derive(Deserialize)]
struct StoredReliefItem {
    item: String,
    priority: ReliefPriority,
    #[serde(default)]
    quantity: Option<String>,
}

impl ReliefItem {
    /// Parses a stored record. Never fails: a record that is not a valid
    /// relief object is shown verbatim with medium priority.
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<StoredReliefItem>(raw) {
            Ok(stored) => Self {
                item: stored.item,
                priority: stored.priority,
                quantity: stored
                    .quantity
                    .unwrap_or_else(|| DEFAULT_QUANTITY.to_string()),
            },
            Err(_) => Self {
                item: raw.to_string(),
                priority: ReliefPriority::Medium,
                quantity: DEFAULT_QUANTITY.to_string(),
            },
        }
    }

    /// Serialized form written into `needed_relief`.
    pub fn to_record(&self) -> String {
        serde_json::json!({
            "item": self.item,
            "priority": self.priority,
            "quantity": self.quantity,
        })
        .to_string()
    }
}

impl From<ReliefItemInput> for ReliefItem {
    fn from(input: ReliefItemInput) -> Self {
        let quantity = input
            .quantity
            .filter(|q| !q.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_QUANTITY.to_string());

        Self {
            item: input.item,
            priority: input.priority,
            quantity,
        }
    }
}
