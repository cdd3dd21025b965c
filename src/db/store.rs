//! Persistence collaborator for alerts and responses.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::debug;
use uuid::Uuid;

use super::{queries, DbPool};
use crate::models::alert::{Alert, AlertStatus, NewAlert};
use crate::models::response::NewResponse;

#[async_trait]
pub trait AlertStore: Send + Sync {
    /// All active alerts, newest first.
    async fn fetch_active(&self) -> Result<Vec<Alert>>;

    async fn insert_alert(&self, alert: &NewAlert) -> Result<Alert>;

    async fn set_status(&self, alert_id: Uuid, status: AlertStatus) -> Result<()>;

    async fn delete_responses(&self, alert_id: Uuid) -> Result<()>;

    async fn insert_response(&self, response: &NewResponse) -> Result<()>;
}

pub struct PgAlertStore {
    pool: DbPool,
}

impl PgAlertStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_alert(row: &PgRow) -> Result<Alert> {
    let severity: String = row.try_get("severity")?;
    let status: Option<String> = row.try_get("status")?;

    Ok(Alert {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        location: row.try_get("location")?,
        severity: severity.parse()?,
        image_url: row.try_get("image_url")?,
        needed_relief: row
            .try_get::<Option<Vec<String>>, _>("needed_relief")?
            .unwrap_or_default(),
        status: AlertStatus::parse_lenient(status.as_deref()),
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        contact_info: row.try_get("contact_info")?,
        additional_notes: row.try_get("additional_notes")?,
    })
}

#[async_trait]
impl AlertStore for PgAlertStore {
    async fn fetch_active(&self) -> Result<Vec<Alert>> {
        let rows = sqlx::query(queries::SELECT_ACTIVE_ALERTS)
            .fetch_all(&self.pool)
            .await
            .context("select active alerts")?;

        debug!("Fetched {} active alerts", rows.len());
        rows.iter().map(row_to_alert).collect()
    }

    async fn insert_alert(&self, alert: &NewAlert) -> Result<Alert> {
        let row = sqlx::query(queries::INSERT_ALERT)
            .bind(&alert.title)
            .bind(&alert.description)
            .bind(&alert.location)
            .bind(alert.severity.as_str())
            .bind(&alert.image_url)
            .bind(alert.needed_relief.clone())
            .bind(alert.created_by)
            .bind(&alert.contact_info)
            .bind(&alert.additional_notes)
            .fetch_one(&self.pool)
            .await
            .context("insert alert")?;

        row_to_alert(&row)
    }

    async fn set_status(&self, alert_id: Uuid, status: AlertStatus) -> Result<()> {
        sqlx::query(queries::UPDATE_ALERT_STATUS)
            .bind(alert_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .context("update alert status")?;
        Ok(())
    }

    async fn delete_responses(&self, alert_id: Uuid) -> Result<()> {
        sqlx::query(queries::DELETE_RESPONSES_FOR_ALERT)
            .bind(alert_id)
            .execute(&self.pool)
            .await
            .context("delete responses")?;
        Ok(())
    }

    async fn insert_response(&self, response: &NewResponse) -> Result<()> {
        sqlx::query(queries::INSERT_RESPONSE)
            .bind(response.alert_id)
            .bind(response.responder_id)
            .bind(&response.response_type)
            .execute(&self.pool)
            .await
            .context("insert response")?;
        Ok(())
    }
}
