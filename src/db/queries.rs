pub const SELECT_ACTIVE_ALERTS: &str = r#"
SELECT id, title, description, location, severity, image_url, needed_relief, status,
       created_by, created_at, contact_info, additional_notes
FROM disaster_alerts
WHERE status = 'active'
ORDER BY created_at DESC;
"#;

pub const INSERT_ALERT: &str = r#"
INSERT INTO disaster_alerts (
    title, description, location, severity, image_url, needed_relief, status,
    created_by, contact_info, additional_notes
) VALUES ($1, $2, $3, $4, $5, $6, 'active', $7, $8, $9)
RETURNING id, title, description, location, severity, image_url, needed_relief, status,
          created_by, created_at, contact_info, additional_notes;
"#;

pub const UPDATE_ALERT_STATUS: &str = r#"
UPDATE disaster_alerts
SET status = $2
WHERE id = $1;
"#;

pub const DELETE_RESPONSES_FOR_ALERT: &str = r#"
DELETE FROM disaster_responses WHERE alert_id = $1;
"#;

pub const INSERT_RESPONSE: &str = r#"
INSERT INTO disaster_responses (alert_id, responder_id, response_type)
VALUES ($1, $2, $3);
"#;
