use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use crate::reason::ReasonLevel;

pub const MEAN_PLACEHOLDER: &str = "{mean_diff}";
pub const MIN_PLACEHOLDER: &str = "{min_diff}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelTemplates {
    pub top: String,
    pub mid: String,
    pub low: String,
}

impl LevelTemplates {
    fn with_advice(mid_advice: &str, low_advice: &str) -> Self {
        Self {
            top: "Mean margin {mean_diff} levels, smallest margin {min_diff}: top band, admission is very likely.".to_string(),
            mid: format!("Mean margin {{mean_diff}} levels, smallest margin {{min_diff}}: middle band, {mid_advice}."),
            low: format!("Mean margin {{mean_diff}} levels, smallest margin {{min_diff}}: lower band, {low_advice}."),
        }
    }

    pub fn for_level(&self, level: ReasonLevel) -> &str {
        match level {
            ReasonLevel::Top => &self.top,
            ReasonLevel::Mid => &self.mid,
            ReasonLevel::Low => &self.low,
        }
    }
}

/// Templates keyed by program group, with a default family for groups that
/// have none of their own.
#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    by_group: BTreeMap<String, LevelTemplates>,
    default: LevelTemplates,
}

static BUILTIN: Lazy<TemplateLibrary> = Lazy::new(TemplateLibrary::builtin);

impl TemplateLibrary {
    pub fn new(default: LevelTemplates) -> Self {
        Self {
            by_group: BTreeMap::new(),
            default,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>, templates: LevelTemplates) -> Self {
        self.by_group.insert(group.into(), templates);
        self
    }

    pub fn shared() -> &'static TemplateLibrary {
        &BUILTIN
    }

    pub fn builtin() -> Self {
        Self::new(LevelTemplates::with_advice(
            "prepare for the department's distinctive requirements",
            "keep related departments as backups",
        ))
        .with_group(
            "工程",
            LevelTemplates::with_advice(
                "strengthen math and science or interview preparation",
                "keep related departments as backups",
            ),
        )
        .with_group(
            "管理",
            LevelTemplates::with_advice(
                "prepare the school's signature review items",
                "keep other management departments as backups",
            ),
        )
        .with_group(
            "文史哲",
            LevelTemplates::with_advice(
                "deepen background reading",
                "explore other related departments",
            ),
        )
        .with_group(
            "醫藥衛生",
            LevelTemplates::with_advice(
                "reinforce the specialist subjects",
                "keep related departments as backups",
            ),
        )
        .with_group(
            "資訊",
            LevelTemplates::with_advice(
                "start on programming fundamentals early",
                "keep other computing departments as backups",
            ),
        )
        .with_group(
            "生物資源",
            LevelTemplates::with_advice(
                "build up relevant practical experience",
                "keep related departments as backups",
            ),
        )
        .with_group(
            "外語",
            LevelTemplates::with_advice(
                "work on language proficiency",
                "keep other language departments as backups",
            ),
        )
    }

    pub fn lookup(&self, group: &str, level: ReasonLevel) -> &str {
        self.by_group
            .get(group)
            .unwrap_or(&self.default)
            .for_level(level)
    }
}

pub fn render(template: &str, mean_delta: f64, min_delta: f64) -> String {
    template
        .replace(MEAN_PLACEHOLDER, &format!("{mean_delta:+.1}"))
        .replace(MIN_PLACEHOLDER, &format!("{min_delta:+.1}"))
}
