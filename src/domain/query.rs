use serde::Serialize;
use thiserror::Error;

use crate::domain::course::Course;

/// Sentinel accepted in place of a level name to disable level filtering.
pub const ALL_LEVELS: &str = "all";

#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("desired count must be greater than zero")]
    ZeroCount,
    #[error("minimum similarity must be within [0, 1], got {0}")]
    SimilarityOutOfRange(f32),
}

/// Restricts results to courses whose level contains the given text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LevelFilter {
    All,
    Level(String),
}

impl LevelFilter {
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case(ALL_LEVELS) {
            LevelFilter::All
        } else {
            LevelFilter::Level(value.to_string())
        }
    }

    /// Case-insensitive substring match against a course level.
    pub fn accepts(&self, level: &str) -> bool {
        match self {
            LevelFilter::All => true,
            LevelFilter::Level(wanted) => level.to_lowercase().contains(&wanted.to_lowercase()),
        }
    }
}

/// A validated recommendation request.
#[derive(Clone, Debug)]
pub struct RecommendationQuery {
    text: String,
    desired_count: usize,
    min_similarity: f32,
    level: LevelFilter,
}

impl RecommendationQuery {
    pub fn new(
        text: impl Into<String>,
        desired_count: usize,
        min_similarity: f32,
        level: LevelFilter,
    ) -> Result<Self, QueryError> {
        if desired_count == 0 {
            return Err(QueryError::ZeroCount);
        }
        if !(0.0..=1.0).contains(&min_similarity) {
            return Err(QueryError::SimilarityOutOfRange(min_similarity));
        }
        Ok(Self {
            text: text.into(),
            desired_count,
            min_similarity,
            level,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn desired_count(&self) -> usize {
        self.desired_count
    }

    pub fn min_similarity(&self) -> f32 {
        self.min_similarity
    }

    pub fn level(&self) -> &LevelFilter {
        &self.level
    }

    /// Lowercase whitespace-separated query tokens used for keyword matching.
    pub fn keywords(&self) -> Vec<String> {
        self.text
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedResult {
    pub course: Course,
    pub similarity: f32,
}

/// Outcome of a ranking call.
#[derive(Clone, Debug, PartialEq)]
pub enum Recommendation {
    /// Similarity and keyword matches, best first.
    Ranked(Vec<RankedResult>),
    /// Substring matches in catalog order, each with similarity 0.0.
    Fallback(Vec<RankedResult>),
    NoMatch,
}

impl Recommendation {
    pub fn results(&self) -> &[RankedResult] {
        match self {
            Recommendation::Ranked(results) | Recommendation::Fallback(results) => results,
            Recommendation::NoMatch => &[],
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Recommendation::Fallback(_))
    }

    pub fn is_no_match(&self) -> bool {
        matches!(self, Recommendation::NoMatch)
    }
}
