use anyhow::Result;

use crate::catalog::Catalog;
use crate::session::SessionView;

pub fn session_to_csv(view: &SessionView) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "tier",
        "id",
        "program",
        "school",
        "department",
        "group",
        "level",
        "min_delta",
        "mean_delta",
        "summary",
    ])?;
    for tier_view in &view.tiers {
        for item in &tier_view.items {
            writer.write_record([
                item.tier.as_slug().to_string(),
                item.id.clone(),
                item.name().to_string(),
                item.program.school().to_string(),
                item.program.department().to_string(),
                item.program.group().to_string(),
                item.reason
                    .level
                    .map(|l| format!("{l:?}").to_lowercase())
                    .unwrap_or_default(),
                item.reason
                    .min_delta
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
                item.reason
                    .mean_delta
                    .map(|d| format!("{d:.2}"))
                    .unwrap_or_default(),
                item.reason.summary.clone(),
            ])?;
        }
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn catalog_to_csv(catalog: &Catalog) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "program",
        "school",
        "department",
        "group",
        "subjects",
        "total_threshold",
    ])?;
    for program in &catalog.programs {
        let subjects = program
            .thresholds()
            .iter()
            .map(|t| format!("{}={}", t.subject.as_slug(), t.level))
            .collect::<Vec<_>>()
            .join(";");
        writer.write_record([
            program.name().to_string(),
            program.school().to_string(),
            program.department().to_string(),
            program.group().to_string(),
            subjects,
            program.total_threshold().to_string(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}
