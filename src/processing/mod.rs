use serde::{Deserialize, Serialize};

use crate::domain::course::Course;
use crate::processing::recommendation::RecommendationRow;

pub mod card;
pub mod embedding;
pub mod ranking;
pub mod recommendation;

/// Requests accepted on the service socket.
#[derive(Deserialize, Debug)]
pub enum ZMQMessage {
    Recommend(RecommendRequest),
    /// First catalog rows, `preview_rows` of them when no count is given.
    Preview(Option<usize>),
}

/// A recommendation request. Missing parameters take configured defaults.
#[derive(Deserialize, Debug, Default)]
pub struct RecommendRequest {
    pub query: String,
    pub num_of_rec: Option<usize>,
    pub min_similarity: Option<f32>,
    pub level: Option<String>,
}

#[derive(Serialize, Debug)]
pub enum ZMQReply {
    Recommendations {
        fallback: bool,
        rows: Vec<RecommendationRow>,
    },
    NoMatch {
        message: String,
    },
    Preview(Vec<Course>),
    Error(String),
}
