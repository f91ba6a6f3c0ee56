use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::error::MigrateError;
use crate::pipeline::{MigrationReport, PlanEntry};

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Workspace")]
    workspace: String,
    #[tabled(rename = "ID")]
    workspace_id: String,
    #[tabled(rename = "Statefile")]
    statefile: String,
    #[tabled(rename = "MD5")]
    md5: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "Workspace")]
    workspace: String,
    #[tabled(rename = "Blob")]
    blob: String,
    #[tabled(rename = "Statefile")]
    statefile: String,
    #[tabled(rename = "In bucket")]
    present: &'static str,
}

pub fn render_report(report: &MigrationReport) -> String {
    let mut rows: Vec<OutcomeRow> = report
        .outcomes
        .iter()
        .map(|outcome| OutcomeRow {
            workspace: outcome.workspace_name.clone(),
            workspace_id: outcome.workspace_id.clone(),
            statefile: outcome.statefile.display().to_string(),
            md5: outcome.md5.clone().unwrap_or_else(|| "-".to_string()),
            status: outcome.status.to_string(),
        })
        .collect();

    if let Some(failure) = &report.failure {
        let (workspace, status) = match failure {
            MigrateError::Step {
                workspace, step, ..
            } => (workspace.clone(), format!("failed at {}", step)),
            other => ("-".to_string(), format!("failed: {}", other)),
        };
        rows.push(OutcomeRow {
            workspace,
            workspace_id: "-".to_string(),
            statefile: "-".to_string(),
            md5: "-".to_string(),
            status,
        });
    }

    if rows.is_empty() {
        return "No migration targets.".to_string();
    }

    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn render_plan(plan: &[PlanEntry]) -> String {
    if plan.is_empty() {
        return "No migration targets.".to_string();
    }

    let rows = plan.iter().map(|entry| PlanRow {
        workspace: entry.workspace_name.clone(),
        blob: entry.blob_path.clone(),
        statefile: entry.statefile.display().to_string(),
        present: if entry.blob_exists { "yes" } else { "MISSING" },
    });

    Table::new(rows).with(Style::rounded()).to_string()
}
