use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::catalog::normalize::normalize_records;
use crate::catalog::{Catalog, CatalogReport, RawProgramRecord, SkipReason, SkippedRecord};

pub const BUILTIN_SOURCE: &str = "builtin";

#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    pub catalog: Catalog,
    pub report: CatalogReport,
}

/// Loads and normalizes the dataset at `path`, falling back to the built-in
/// fixtures when no path is given or the file does not exist.
pub fn load_catalog(path: Option<&Path>) -> Result<LoadedCatalog> {
    let Some(path) = path else {
        return Ok(load_builtin());
    };
    if !path.exists() {
        warn!(
            "dataset {} not found, using built-in fixture programs",
            path.display()
        );
        return Ok(load_builtin());
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("failed reading dataset: {}", path.display()))?;
    let (records, pre_skipped) = parse_records(&data)
        .with_context(|| format!("failed parsing dataset header: {}", path.display()))?;
    info!("read {} dataset rows from {}", records.len(), path.display());
    let (catalog, report) = normalize_records(&records, pre_skipped, path.display().to_string());
    Ok(LoadedCatalog { catalog, report })
}

pub fn load_builtin() -> LoadedCatalog {
    let records = builtin_records()
        .into_iter()
        .enumerate()
        .map(|(idx, record)| (idx + 1, record))
        .collect::<Vec<_>>();
    let (catalog, report) = normalize_records(&records, Vec::new(), BUILTIN_SOURCE);
    LoadedCatalog { catalog, report }
}

/// Reads CSV rows with `program_name`, `expanded_score_dict` and `group`
/// columns. Rows that cannot be deserialized are returned as skipped records.
pub fn parse_records(
    data: &str,
) -> Result<(Vec<(usize, RawProgramRecord)>, Vec<SkippedRecord>)> {
    let data = data.strip_prefix('\u{feff}').unwrap_or(data);
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(data.as_bytes());
    reader.headers()?;

    let mut records = Vec::new();
    let mut skipped = Vec::new();
    for (idx, row) in reader.deserialize::<RawProgramRecord>().enumerate() {
        let row_number = idx + 1;
        match row {
            Ok(record) => records.push((row_number, record)),
            Err(error) => {
                warn!("row {row_number}: unreadable dataset row ({error})");
                skipped.push(SkippedRecord {
                    row: row_number,
                    name: String::new(),
                    reason: SkipReason::MalformedRecord,
                    detail: error.to_string(),
                });
            }
        }
    }
    Ok((records, skipped))
}

pub fn builtin_records() -> Vec<RawProgramRecord> {
    vec![
        RawProgramRecord::new("世新大學 企業管理學系", "{'國': 12, '社': 12}", "管理"),
        RawProgramRecord::new("世新大學 傳播管理學系", "{'國': 11}", "管理"),
        RawProgramRecord::new("世新大學 行政管理學系", "{'英': 10, '社': 10}", "管理"),
        RawProgramRecord::new("世新大學 財務金融學系", "{'數B': 10, '社': 10}", "管理"),
        RawProgramRecord::new("銘傳大學 應用中文與華語文教", "{'國': 10, '英': 10}", "文史哲"),
        RawProgramRecord::new("世新大學 數位多媒體設計學系", "{'國': 11}", "藝術"),
        RawProgramRecord::new(
            "某大學 醫學系",
            "{'國': 14, '英': 14, '數A': 14, '自': 14}",
            "醫藥衛生",
        ),
        RawProgramRecord::new("某大學 護理學系", "{'英': 13, '自': 13}", "醫藥衛生"),
        RawProgramRecord::new("某大學 資訊工程學系", "{'數A': 12, '自': 12}", "資訊"),
        RawProgramRecord::new("某大學 生物資源學系", "{'自': 11, '數A': 11}", "生物資源"),
        RawProgramRecord::new("國立臺灣大學 外國語文學系", "{'國': 13, '英': 13}", "外語"),
    ]
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn builtin_fixtures_normalize_cleanly() {
        let loaded = load_builtin();
        assert_eq!(loaded.catalog.len(), 11);
        assert!(loaded.report.skipped.is_empty());
        assert_eq!(loaded.report.source, BUILTIN_SOURCE);
        assert!(loaded.catalog.schools.contains(&"國立臺灣大學".to_string()));
        assert!(loaded.catalog.groups.contains(&"醫藥衛生".to_string()));
    }

    #[test]
    fn missing_file_falls_back_to_fixtures() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loaded = load_catalog(Some(&dir.path().join("programs.csv"))).expect("fallback");
        assert_eq!(loaded.report.source, BUILTIN_SOURCE);
        assert_eq!(loaded.catalog.len(), 11);
    }

    #[test]
    fn reads_csv_with_bom_and_extra_columns() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            "\u{feff}program_name,expanded_score_dict,group,school\n\
             世新大學 企業管理學系,\"{{'國': 12, '社': 12}}\",管理,世新大學\n\
             甲大學 物理系,\"{{'物': 12}}\",理學,甲大學\n\
             乙大學 化學系\n"
        )
        .expect("write csv");

        let loaded = load_catalog(Some(file.path())).expect("load csv");
        assert_eq!(loaded.catalog.len(), 1);
        assert_eq!(loaded.report.total_records, 3);
        assert_eq!(loaded.report.skipped_count(SkipReason::InvalidSubjects), 1);
        assert_eq!(loaded.report.skipped_count(SkipReason::MalformedRecord), 1);
        let program = &loaded.catalog.programs[0];
        assert_eq!(program.department(), "企業管理學系");
        assert_eq!(program.total_threshold(), 24);
    }
}
