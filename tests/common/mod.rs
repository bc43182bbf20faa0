//! Helpers for integration tests.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use course_recommender::processing::embedding::{Encoder, EncoderError};
use tempfile::NamedTempFile;

pub const CATALOG_HEADER: &str = "course_id,course_title,url,price,review,level,subject";

/// Temporary catalog file used in integration tests.
pub struct TestCatalog {
    file: NamedTempFile,
}

impl TestCatalog {
    /// Write `rows` below the standard header.
    pub fn new(rows: &[&str]) -> Self {
        let mut file = NamedTempFile::new().expect("Failed to create temporary catalog.");
        writeln!(file, "{CATALOG_HEADER}").expect("Failed to write catalog header.");
        for row in rows {
            writeln!(file, "{row}").expect("Failed to write catalog row.");
        }
        file.flush().expect("Failed to flush catalog.");
        TestCatalog { file }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Encoder returning fixed vectors per text, and `default` for anything
/// unknown.
pub struct LookupEncoder {
    vectors: HashMap<String, Vec<f32>>,
    default: Vec<f32>,
    pub calls: usize,
}

impl LookupEncoder {
    pub fn new(default: Vec<f32>) -> Self {
        Self {
            vectors: HashMap::new(),
            default,
            calls: 0,
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }
}

impl Encoder for LookupEncoder {
    fn encode(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncoderError> {
        self.calls += 1;
        Ok(texts
            .iter()
            .map(|text| {
                self.vectors
                    .get(text)
                    .cloned()
                    .unwrap_or_else(|| self.default.clone())
            })
            .collect())
    }
}
