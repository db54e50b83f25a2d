use std::collections::HashMap;

use serde::Serialize;

use super::domain::{Application, Position, PositionId};

/// Flat CSV row for one application joined to its position title.
#[derive(Debug, Serialize)]
struct ApplicationExportRow {
    application_id: String,
    position_id: String,
    position_title: String,
    candidate_name: String,
    candidate_email: String,
    status: &'static str,
    overall_result: &'static str,
    evaluation_status: &'static str,
    total_score: Option<f64>,
    started_at: String,
    completed_at: Option<String>,
}

/// Render a manager's applications as CSV for spreadsheet handoff.
pub(crate) fn applications_csv(
    positions: &[Position],
    applications: &[Application],
) -> Result<String, csv::Error> {
    let titles: HashMap<&PositionId, &str> = positions
        .iter()
        .map(|position| (&position.id, position.title.as_str()))
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());
    for application in applications {
        writer.serialize(ApplicationExportRow {
            application_id: application.id.0.clone(),
            position_id: application.position_id.0.clone(),
            position_title: titles
                .get(&application.position_id)
                .copied()
                .unwrap_or_default()
                .to_string(),
            candidate_name: application.candidate_name.clone(),
            candidate_email: application.candidate_email.clone(),
            status: application.status.label(),
            overall_result: application.overall_result.label(),
            evaluation_status: application.evaluation_status.label(),
            total_score: application.total_score,
            started_at: application.started_at.to_rfc3339(),
            completed_at: application
                .completed_at
                .map(|completed_at| completed_at.to_rfc3339()),
        })?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
