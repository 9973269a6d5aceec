use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::catalog::loader::LoadedCatalog;
use crate::catalog::{Program, SkipReason};
use crate::eligibility::Evaluation;
use crate::reason::{Reason, ReasonLevel};
use crate::session::{RemovalOutcome, SessionView};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn level_cell(level: Option<ReasonLevel>) -> Cell {
    match level {
        Some(ReasonLevel::Top) => Cell::new("TOP").fg(Color::Green),
        Some(ReasonLevel::Mid) => Cell::new("MID").fg(Color::Yellow),
        Some(ReasonLevel::Low) => Cell::new("LOW").fg(Color::Red),
        None => Cell::new("-"),
    }
}

fn thresholds_label(program: &Program) -> String {
    program
        .thresholds()
        .iter()
        .map(|t| format!("{} {}", t.subject, t.level))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn render_session_table(view: &SessionView) -> String {
    let mut table = new_table();
    table.set_header(vec!["Tier", "Program", "Group", "Required", "Level", "Reason", "Id"]);

    for tier_view in &view.tiers {
        for item in &tier_view.items {
            table.add_row(Row::from(vec![
                Cell::new(item.tier.to_string()),
                Cell::new(item.name()),
                Cell::new(item.program.group()),
                Cell::new(thresholds_label(&item.program)),
                level_cell(item.reason.level),
                Cell::new(&item.reason.summary),
                Cell::new(short_id(&item.id)),
            ]));
        }
    }

    let mut lines = vec![table.to_string()];
    if let Some(adjustment) = &view.adjustment {
        lines.push(adjustment.message());
    }
    lines.extend(view.tiers.iter().map(|t| t.status.clone()));
    let diagnostics = &view.diagnostics;
    if diagnostics.missing_subject_programs > 0 {
        let missing = diagnostics
            .missing_subjects
            .iter()
            .map(|(subject, count)| format!("{subject} ({count})"))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!(
            "{} programs skipped for missing subjects: {missing}",
            diagnostics.missing_subject_programs
        ));
    }
    lines.join("\n")
}

pub fn render_removals(outcomes: &[RemovalOutcome]) -> String {
    let mut table = new_table();
    table.set_header(vec!["Tier", "Removed", "Replacement", "Shown/Target", "Remaining"]);
    for outcome in outcomes {
        table.add_row(vec![
            outcome.tier.to_string(),
            outcome.removed.name().to_string(),
            outcome
                .replacement
                .as_ref()
                .map(|item| item.name().to_string())
                .unwrap_or_else(|| "-".to_string()),
            format!("{}/{}", outcome.counts.shown, outcome.counts.target),
            outcome.counts.available.to_string(),
        ]);
    }
    table.to_string()
}

pub fn render_catalog_table(loaded: &LoadedCatalog) -> String {
    let mut table = new_table();
    table.set_header(vec!["Program", "School", "Department", "Group", "Required", "Total"]);
    for program in &loaded.catalog.programs {
        table.add_row(vec![
            program.name().to_string(),
            program.school().to_string(),
            program.department().to_string(),
            program.group().to_string(),
            thresholds_label(program),
            program.total_threshold().to_string(),
        ]);
    }

    let report = &loaded.report;
    let mut lines = vec![
        table.to_string(),
        format!(
            "source: {} | records: {} | accepted: {} | skipped: {}",
            report.source,
            report.total_records,
            report.accepted,
            report.skipped.len()
        ),
    ];
    if !report.skipped.is_empty() {
        lines.push(format!(
            "skipped by reason - malformed record: {}, malformed scores: {}, invalid subjects: {}, out of range: {}, duplicate: {}",
            report.skipped_count(SkipReason::MalformedRecord),
            report.skipped_count(SkipReason::MalformedScores),
            report.skipped_count(SkipReason::InvalidSubjects),
            report.skipped_count(SkipReason::ScoreOutOfRange),
            report.skipped_count(SkipReason::DuplicateProgram)
        ));
    }
    if !report.invalid_subjects.is_empty() {
        lines.push(format!(
            "unrecognized subject keys: {}",
            report.invalid_subjects.join(", ")
        ));
    }
    lines.push(format!("groups: {}", loaded.catalog.groups.join(", ")));
    lines.join("\n")
}

pub fn render_explanation(program: &Program, evaluation: &Evaluation, reason: &Reason) -> String {
    let mut table = new_table();
    table.set_header(vec!["Subject", "Required", "Score", "Delta"]);
    if let Some(classification) = evaluation.classification() {
        for delta in &classification.deltas {
            let delta_cell = if delta.delta < 0 {
                Cell::new(format!("{:+}", delta.delta)).fg(Color::Red)
            } else {
                Cell::new(format!("{:+}", delta.delta)).fg(Color::Green)
            };
            table.add_row(Row::from(vec![
                Cell::new(delta.subject.to_string()),
                Cell::new(delta.threshold.to_string()),
                Cell::new(delta.score.to_string()),
                delta_cell,
            ]));
        }
    }

    let tier = evaluation
        .tier()
        .map(|t| t.to_string())
        .unwrap_or_else(|| "not classified".to_string());
    let mut lines = vec![
        format!("{} [{}] - {tier}", program.name(), program.group()),
        reason.summary.clone(),
    ];
    if evaluation.classification().is_some() {
        lines.push(table.to_string());
    }
    lines.join("\n")
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
