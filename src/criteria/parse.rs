use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScoreMapError {
    #[error("score mapping must be enclosed in braces")]
    MissingBraces,
    #[error("score mapping is empty")]
    Empty,
    #[error("malformed entry `{0}`")]
    MalformedEntry(String),
    #[error("non-integer value for `{key}`: {value}")]
    InvalidValue { key: String, value: String },
    #[error("duplicate key `{0}`")]
    DuplicateKey(String),
}

/// Parses a flat `{'key': int, ...}` literal, keeping the order keys appear in.
pub fn parse_score_map(raw: &str) -> Result<Vec<(String, i64)>, ScoreMapError> {
    let body = raw
        .trim()
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .ok_or(ScoreMapError::MissingBraces)?;

    let mut entries: Vec<(String, i64)> = Vec::new();
    for piece in body.split(',') {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        let (key, value) = piece
            .split_once(':')
            .ok_or_else(|| ScoreMapError::MalformedEntry(piece.to_string()))?;
        let key = unquote(key.trim())
            .ok_or_else(|| ScoreMapError::MalformedEntry(piece.to_string()))?;
        let value = value.trim();
        let parsed = value
            .parse::<i64>()
            .map_err(|_| ScoreMapError::InvalidValue {
                key: key.clone(),
                value: value.to_string(),
            })?;
        if entries.iter().any(|(existing, _)| *existing == key) {
            return Err(ScoreMapError::DuplicateKey(key));
        }
        entries.push((key, parsed));
    }

    if entries.is_empty() {
        return Err(ScoreMapError::Empty);
    }
    Ok(entries)
}

fn unquote(token: &str) -> Option<String> {
    let inner = token
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .or_else(|| token.strip_prefix('"').and_then(|t| t.strip_suffix('"')))?;
    let inner = inner.trim();
    if inner.is_empty() {
        None
    } else {
        Some(inner.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_python_style_literal_in_order() {
        let parsed = parse_score_map("{'數B': 10, '社': 10}").expect("valid mapping");
        assert_eq!(
            parsed,
            vec![("數B".to_string(), 10), ("社".to_string(), 10)]
        );
    }

    #[test]
    fn accepts_json_quotes_negative_values_and_trailing_comma() {
        let parsed = parse_score_map(r#"{"國": -2, "英": 13,}"#).expect("valid mapping");
        assert_eq!(parsed[0], ("國".to_string(), -2));
        assert_eq!(parsed[1], ("英".to_string(), 13));
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(parse_score_map("'國': 12"), Err(ScoreMapError::MissingBraces));
        assert_eq!(parse_score_map("{}"), Err(ScoreMapError::Empty));
        assert!(matches!(
            parse_score_map("{國: 12}"),
            Err(ScoreMapError::MalformedEntry(_))
        ));
        assert!(matches!(
            parse_score_map("{'國': 12.5}"),
            Err(ScoreMapError::InvalidValue { .. })
        ));
        assert_eq!(
            parse_score_map("{'國': 12, '國': 11}"),
            Err(ScoreMapError::DuplicateKey("國".to_string()))
        );
    }
}
