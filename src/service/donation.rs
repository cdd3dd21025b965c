use serde::Deserialize;
use tracing::info;

use crate::error::ActionError;
use crate::notice::Notice;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationForm {
    pub item_name: String,
    pub quantity: String,
    pub description: String,
    pub contact: String,
}

/// Acknowledges a supply pledge. Pledges are not persisted.
pub fn register_donation(form: &DonationForm) -> Result<Notice, ActionError> {
    let fields = [
        ("Item name", &form.item_name),
        ("Quantity", &form.quantity),
        ("Description", &form.description),
        ("Contact information", &form.contact),
    ];

    if let Some((label, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(ActionError::Invalid(format!("{} is required.", label)));
    }

    info!("Donation pledged: {} x {}", form.quantity, form.item_name);
    Ok(Notice::success(
        "Donation Registered",
        "Thank you for your generous donation! We will contact you soon.",
    ))
}
