use serde::Serialize;

use crate::domain::course::{Course, Platform};
use crate::domain::query::{
    LevelFilter, QueryError, RankedResult, Recommendation, RecommendationQuery,
};
use crate::models::config::AppConfig;
use crate::processing::card::course_card_html;
use crate::processing::embedding::{Encoder, EncoderError};
use crate::processing::ranking::CatalogIndex;
use crate::processing::{RecommendRequest, ZMQMessage, ZMQReply};

/// Shown to the user when neither ranking nor fallback finds a course.
pub const NO_MATCH_MESSAGE: &str =
    "No suitable course found. Try searching with different wording.";

/// A ranked course prepared for display.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecommendationRow {
    pub title: String,
    pub similarity: f32,
    pub url: String,
    pub price: String,
    pub review_count: u64,
    pub platform: Platform,
    pub card: String,
}

/// Answers recommendation requests against a catalog indexed at start-up.
pub struct Recommender<E> {
    index: CatalogIndex,
    encoder: E,
    config: AppConfig,
}

impl<E: Encoder> Recommender<E> {
    pub fn new(index: CatalogIndex, encoder: E, config: AppConfig) -> Self {
        Self {
            index,
            encoder,
            config,
        }
    }

    /// Build a query, filling missing parameters from the configuration.
    pub fn query(&self, request: &RecommendRequest) -> Result<RecommendationQuery, QueryError> {
        let level = request.level.as_deref().unwrap_or(&self.config.level);
        RecommendationQuery::new(
            request.query.clone(),
            request.num_of_rec.unwrap_or(self.config.num_of_rec),
            request.min_similarity.unwrap_or(self.config.min_similarity),
            LevelFilter::parse(level),
        )
    }

    pub fn recommend(
        &mut self,
        query: &RecommendationQuery,
    ) -> Result<Recommendation, EncoderError> {
        self.index.recommend(query, &mut self.encoder)
    }

    pub fn row(&self, result: &RankedResult) -> RecommendationRow {
        let course = &result.course;
        let mut row = RecommendationRow {
            title: course.title.clone(),
            similarity: result.similarity,
            url: course.url.clone(),
            price: course.formatted_price(&self.config.currency_symbol, &self.config.free_label),
            review_count: course.review_count,
            platform: course.platform(),
            card: String::new(),
        };
        row.card = course_card_html(&row);
        row
    }

    pub fn preview(&self, rows: usize) -> Vec<Course> {
        self.index.courses().iter().take(rows).cloned().collect()
    }

    /// Handle a raw socket payload. Never fails; problems become
    /// [`ZMQReply::Error`].
    pub fn process_raw_message(&mut self, payload: &[u8]) -> ZMQReply {
        match serde_json::from_slice::<ZMQMessage>(payload) {
            Ok(message) => self.process_message(message),
            Err(e) => {
                log::error!("Failed to parse JSON: {e}");
                ZMQReply::Error(format!("invalid request: {e}"))
            }
        }
    }

    pub fn process_message(&mut self, msg: ZMQMessage) -> ZMQReply {
        log::info!("Received message: {msg:?}");

        match msg {
            ZMQMessage::Recommend(request) => self.process_recommend_request(&request),
            ZMQMessage::Preview(rows) => {
                ZMQReply::Preview(self.preview(rows.unwrap_or(self.config.preview_rows)))
            }
        }
    }

    fn process_recommend_request(&mut self, request: &RecommendRequest) -> ZMQReply {
        let query = match self.query(request) {
            Ok(query) => query,
            Err(e) => {
                log::warn!("Rejected recommendation request: {e}");
                return ZMQReply::Error(e.to_string());
            }
        };

        let recommendation = match self.recommend(&query) {
            Ok(recommendation) => recommendation,
            Err(e) => {
                log::error!("Failed to rank courses for {:?}: {e}", query.text());
                return ZMQReply::Error(e.to_string());
            }
        };

        if recommendation.is_no_match() {
            log::info!("No courses matched {:?}", query.text());
            return ZMQReply::NoMatch {
                message: NO_MATCH_MESSAGE.to_string(),
            };
        }

        let rows: Vec<RecommendationRow> = recommendation
            .results()
            .iter()
            .map(|result| self.row(result))
            .collect();

        log::info!(
            "Recommended {} courses for {:?} (fallback={})",
            rows.len(),
            query.text(),
            recommendation.is_fallback()
        );

        ZMQReply::Recommendations {
            fallback: recommendation.is_fallback(),
            rows,
        }
    }
}
