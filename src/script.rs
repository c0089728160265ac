//! JSON-lines gesture scripts.
//!
//! Each non-empty line is one classifier result. Blank lines and lines
//! starting with `#` are skipped.
//!
//! ```text
//! {"at_ms": 0, "category": "Thumb_Up", "score": 0.92}
//! {"at_ms": 120, "candidates": [{"category": "Victory", "score": 0.81}]}
//! {"at_ms": 240, "unavailable": true}
//! ```

use crate::classifier::Candidate;
use crate::defaults;
use crate::error::{GestureError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// One scripted classifier result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptEntry {
    /// Offset from script start, used by trace mode.
    #[serde(default)]
    pub at_ms: u64,
    /// Shorthand for a single top candidate.
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Classifier reports itself unavailable for this entry.
    #[serde(default)]
    pub unavailable: bool,
    /// Simulated classification latency.
    #[serde(default)]
    pub latency_ms: u64,
}

impl ScriptEntry {
    /// Ranked candidates for this entry. The `category` shorthand comes first.
    pub fn candidates(&self) -> Vec<Candidate> {
        let mut out = Vec::with_capacity(self.candidates.len() + 1);
        if let Some(category) = &self.category {
            out.push(Candidate::new(category.clone(), self.score.unwrap_or(1.0)));
        }
        out.extend(self.candidates.iter().cloned());
        out
    }

    pub fn at(&self) -> Duration {
        Duration::from_millis(self.at_ms)
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

/// A parsed script, ordered by `at_ms`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    pub entries: Vec<ScriptEntry>,
}

impl Script {
    /// Parses JSON-lines text.
    ///
    /// Timestamps must be non-decreasing; errors carry the 1-based line.
    pub fn parse(text: &str) -> Result<Self> {
        let mut entries: Vec<ScriptEntry> = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let entry: ScriptEntry =
                serde_json::from_str(trimmed).map_err(|e| GestureError::Script {
                    line,
                    message: e.to_string(),
                })?;

            if entry.category.is_some() && entry.unavailable {
                return Err(GestureError::Script {
                    line,
                    message: "an unavailable entry cannot carry a category".to_string(),
                });
            }
            if entry.at_ms.saturating_add(entry.latency_ms) > defaults::MAX_SCRIPT_SPAN_MS {
                return Err(GestureError::Script {
                    line,
                    message: format!(
                        "at_ms {} + latency_ms {} is past the {} ms script limit",
                        entry.at_ms,
                        entry.latency_ms,
                        defaults::MAX_SCRIPT_SPAN_MS
                    ),
                });
            }
            if let Some(last) = entries.last()
                && entry.at_ms < last.at_ms
            {
                return Err(GestureError::Script {
                    line,
                    message: format!(
                        "at_ms {} goes backwards (previous entry at {})",
                        entry.at_ms, last.at_ms
                    ),
                });
            }
            entries.push(entry);
        }

        Ok(Self { entries })
    }

    /// Loads and parses a script file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Offset of the last entry.
    pub fn duration(&self) -> Duration {
        self.entries.last().map(ScriptEntry::at).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
# warm-up
{"at_ms": 0, "category": "Thumb_Up", "score": 0.92}
{"at_ms": 120, "candidates": [{"category": "Victory", "score": 0.81}]}

{"at_ms": 240, "unavailable": true}
{"at_ms": 360, "latency_ms": 50, "category": "None", "score": 0.0}
"#;

    #[test]
    fn test_parse_sample() {
        let script = Script::parse(SAMPLE).unwrap();
        assert_eq!(script.len(), 4);
        assert_eq!(script.duration(), Duration::from_millis(360));
        assert!(script.entries[2].unavailable);
        assert_eq!(script.entries[3].latency(), Duration::from_millis(50));
    }

    #[test]
    fn test_entry_candidates_shorthand_first() {
        let script = Script::parse(
            r#"{"category": "Open_Palm", "score": 0.9, "candidates": [{"category": "Victory", "score": 0.95}]}"#,
        )
        .unwrap();
        let candidates = script.entries[0].candidates();
        assert_eq!(candidates[0], Candidate::new("Open_Palm", 0.9));
        assert_eq!(candidates[1], Candidate::new("Victory", 0.95));
    }

    #[test]
    fn test_category_without_score_is_certain() {
        let script = Script::parse(r#"{"category": "Closed_Fist"}"#).unwrap();
        assert_eq!(script.entries[0].candidates()[0].score, 1.0);
    }

    #[test]
    fn test_parse_reports_line_number() {
        let err = Script::parse("{\"at_ms\": 0}\n\nnot json").unwrap_err();
        assert!(matches!(err, GestureError::Script { line: 3, .. }));
    }

    #[test]
    fn test_parse_rejects_unknown_field() {
        let err = Script::parse(r#"{"at_ms": 0, "label": "x"}"#).unwrap_err();
        assert!(matches!(err, GestureError::Script { line: 1, .. }));
    }

    #[test]
    fn test_parse_rejects_offsets_past_the_limit() {
        let limit = defaults::MAX_SCRIPT_SPAN_MS;
        assert!(Script::parse(&format!("{{\"at_ms\": {limit}}}")).is_ok());

        let text = format!("{{\"at_ms\": 0}}\n{{\"at_ms\": {}}}", u64::MAX);
        let err = Script::parse(&text).unwrap_err();
        assert!(matches!(err, GestureError::Script { line: 2, .. }));

        let text = format!("{{\"at_ms\": {limit}, \"latency_ms\": 1}}");
        assert!(Script::parse(&text).is_err());
    }

    #[test]
    fn test_parse_rejects_backwards_time() {
        let err = Script::parse("{\"at_ms\": 100}\n{\"at_ms\": 50}").unwrap_err();
        assert!(matches!(err, GestureError::Script { line: 2, .. }));
    }

    #[test]
    fn test_parse_rejects_unavailable_with_category() {
        let err =
            Script::parse(r#"{"unavailable": true, "category": "Victory"}"#).unwrap_err();
        assert!(matches!(err, GestureError::Script { line: 1, .. }));
    }

    #[test]
    fn test_empty_script() {
        let script = Script::parse("\n# nothing\n").unwrap();
        assert!(script.is_empty());
        assert_eq!(script.duration(), Duration::ZERO);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"at_ms": 5, "category": "Victory", "score": 0.8}}"#).unwrap();
        let script = Script::load(file.path()).unwrap();
        assert_eq!(script.entries[0].at_ms, 5);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Script::load(Path::new("/nonexistent/gestures.jsonl")).unwrap_err();
        assert!(matches!(err, GestureError::Io(_)));
    }
}
