// file: src/models/score.rs
// description: quality score kinds, bounded score values and persisted score rows
// reference: code quality scores

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const MAX_SCORE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreKind {
    Documentation,
    Bugs,
    Security,
    Performance,
}

impl ScoreKind {
    pub const ALL: [ScoreKind; 4] = [
        ScoreKind::Documentation,
        ScoreKind::Bugs,
        ScoreKind::Security,
        ScoreKind::Performance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreKind::Documentation => "documentation",
            ScoreKind::Bugs => "bugs",
            ScoreKind::Security => "security",
            ScoreKind::Performance => "performance",
        }
    }
}

impl FromStr for ScoreKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ScoreKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown score kind '{}'", s))
    }
}

impl fmt::Display for ScoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A score in `[0, 100]`. Construction is the only way in, so every value
/// that reaches persistence is already in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Score(u8);

impl Score {
    pub const ZERO: Score = Score(0);

    pub fn new(value: i64) -> Result<Self> {
        if !(0..=MAX_SCORE).contains(&value) {
            return Err(PipelineError::ReportParse(format!(
                "score {} is outside [0, {}]",
                value, MAX_SCORE
            )));
        }
        Ok(Self(value as u8))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CodeScores {
    pub documentation: Score,
    pub bugs: Score,
    pub security: Score,
    pub performance: Score,
}

impl CodeScores {
    pub fn zero() -> Self {
        Self {
            documentation: Score::ZERO,
            bugs: Score::ZERO,
            security: Score::ZERO,
            performance: Score::ZERO,
        }
    }

    pub fn get(&self, kind: ScoreKind) -> Score {
        match kind {
            ScoreKind::Documentation => self.documentation,
            ScoreKind::Bugs => self.bugs,
            ScoreKind::Security => self.security,
            ScoreKind::Performance => self.performance,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScoreKind, Score)> + '_ {
        ScoreKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileScoreRecord {
    pub id: Uuid,
    pub file_id: Uuid,
    pub kind: ScoreKind,
    pub score: f64,
}

impl FileScoreRecord {
    pub fn new(file_id: Uuid, kind: ScoreKind, score: Score) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_id,
            kind,
            score: f64::from(score.value()),
        }
    }
}
