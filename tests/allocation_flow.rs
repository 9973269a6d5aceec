use std::io::Write;

use gsat_advisor::catalog::loader::load_catalog;
use gsat_advisor::catalog::SkipReason;
use gsat_advisor::criteria::Subject;
use gsat_advisor::eligibility::Tier;
use gsat_advisor::profile::{Allocation, StudentProfile};
use gsat_advisor::reason::ReasonLevel;
use gsat_advisor::session::store::{SessionStore, SubmitStatus};

const DATASET: &str = "program_name,expanded_score_dict,group\n\
甲大學 企業管理學系,\"{'國': 10}\",管理\n\
乙大學 財務金融學系,\"{'國': 11, '數B': 9}\",管理\n\
丙大學 資訊管理學系,\"{'國': 12}\",管理\n\
丁大學 國際貿易學系,\"{'國': 13}\",管理\n\
戊大學 會計學系,\"{'國': 14}\",管理\n\
己科技大學 觀光學系,\"{'英': 15}\",管理\n\
庚大學 物理學系,\"{'物理': 12}\",理學\n\
辛大學 中國文學系,\"{'國': 20}\",文史哲\n\
壬大學 歷史學系,\"not a dict\",文史哲\n";

#[test]
fn dataset_to_session_to_replenishment() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(DATASET.as_bytes()).expect("write dataset");

    let loaded = load_catalog(Some(file.path())).expect("load dataset");
    assert_eq!(loaded.report.total_records, 9);
    assert_eq!(loaded.catalog.len(), 6);
    assert_eq!(loaded.report.skipped_count(SkipReason::InvalidSubjects), 1);
    assert_eq!(loaded.report.skipped_count(SkipReason::ScoreOutOfRange), 1);
    assert_eq!(loaded.report.skipped_count(SkipReason::MalformedScores), 1);

    let profile = StudentProfile::new()
        .with_score(Subject::Chinese, 13)
        .with_score(Subject::MathB, 10)
        .with_allocation(Allocation::new(1, 1, 1));
    let store = SessionStore::new();
    let view = store.create(&loaded.catalog, profile.clone(), 3);

    // 甲 clears by 3, 乙 丙 丁 clear by less, 戊 falls one short.
    let conservative = &view.tiers[0];
    assert_eq!(conservative.tier, Tier::Conservative);
    assert_eq!(conservative.items.len(), 1);
    assert_eq!(conservative.items[0].program.name(), "甲大學 企業管理學系");
    assert_eq!(conservative.items[0].reason.level, Some(ReasonLevel::Top));

    let realistic = &view.tiers[1];
    assert_eq!(realistic.counts.target, 1);
    assert_eq!(realistic.counts.available, 2);
    let first_realistic = realistic.items[0].clone();
    assert_eq!(first_realistic.program.name(), "乙大學 財務金融學系");

    let ambitious = &view.tiers[2];
    assert_eq!(ambitious.items.len(), 1);
    assert_eq!(ambitious.items[0].program.name(), "戊大學 會計學系");
    assert_eq!(ambitious.items[0].reason.level, Some(ReasonLevel::Low));

    let outcome = store
        .remove_item(&view.session_id, Tier::Realistic, &first_realistic.id)
        .expect("remove shown item");
    let replacement = outcome.replacement.expect("queue not empty");
    assert_eq!(replacement.program.name(), "丁大學 國際貿易學系");
    assert_ne!(replacement.id, first_realistic.id);
    assert_eq!(outcome.counts.available, 1);

    let after = store.view(&view.session_id).expect("session exists");
    assert_eq!(after.tiers[0].items[0].id, conservative.items[0].id);
    assert_eq!(after.tiers[2].items[0].id, ambitious.items[0].id);

    let (status, _) = store
        .submit(&view.session_id, &loaded.catalog, profile, 3)
        .expect("resubmit");
    assert_eq!(status, SubmitStatus::Unchanged);
}
