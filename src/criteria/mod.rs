pub mod parse;
pub mod schema;

pub use parse::{parse_score_map, ScoreMapError};
pub use schema::{clamp_level, Subject, SubjectParseError, Threshold, LEVEL_MAX, LEVEL_MIN};
