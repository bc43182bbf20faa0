use std::io;
use std::path::PathBuf;

use csv::{ReaderBuilder, StringRecord};

use crate::domain::course::Course;
use crate::repository::{CatalogReader, RepositoryError, RepositoryResult};

const TITLE_COLUMN: &str = "course_title";
const URL_COLUMN: &str = "url";
const PRICE_COLUMN: &str = "price";
const REVIEW_COLUMN: &str = "review";
const LEVEL_COLUMN: &str = "level";

/// Reads the course catalog from a comma-separated file with a header row.
///
/// Extra columns are ignored. Rows with more fields than the header or with
/// invalid UTF-8 are skipped; short rows are padded with empty values.
pub struct CsvCatalogRepository {
    path: PathBuf,
}

impl CsvCatalogRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogReader for CsvCatalogRepository {
    fn list_courses(&self) -> RepositoryResult<Vec<Course>> {
        let file = std::fs::File::open(&self.path).map_err(|source| RepositoryError::Open {
            path: self.path.clone(),
            source,
        })?;

        let (courses, skipped) = read_courses(file)?;

        log::info!(
            "Loaded {} courses from {} (skipped_rows={skipped})",
            courses.len(),
            self.path.display()
        );

        Ok(courses)
    }
}

struct Columns {
    title: usize,
    url: usize,
    price: usize,
    review: usize,
    level: usize,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> RepositoryResult<Self> {
        let names: Vec<String> = headers.iter().map(normalize_header).collect();
        let find = |column: &'static str| {
            names
                .iter()
                .position(|name| name == column)
                .ok_or(RepositoryError::MissingColumn(column))
        };

        Ok(Self {
            title: find(TITLE_COLUMN)?,
            url: find(URL_COLUMN)?,
            price: find(PRICE_COLUMN)?,
            review: find(REVIEW_COLUMN)?,
            level: find(LEVEL_COLUMN)?,
        })
    }

    fn course(&self, record: &StringRecord) -> Course {
        let field = |index: usize| record.get(index).unwrap_or("");

        Course {
            title: field(self.title).to_string(),
            price: Course::parse_price(field(self.price)),
            review_count: Course::parse_review_count(field(self.review)),
            level: field(self.level).to_string(),
            url: field(self.url).to_string(),
        }
    }
}

fn normalize_header(name: &str) -> String {
    name.trim_start_matches('\u{feff}').trim().to_string()
}

/// Parse catalog rows, returning the courses and the number of skipped rows.
fn read_courses<R: io::Read>(source: R) -> RepositoryResult<(Vec<Course>, usize)> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(source);

    let headers = reader.headers().map_err(RepositoryError::Header)?.clone();
    let columns = Columns::resolve(&headers)?;

    let mut courses = Vec::new();
    let mut skipped = 0;

    for (row, result) in reader.records().enumerate() {
        match result {
            Ok(record) if record.len() > headers.len() => {
                log::debug!(
                    "Skipping catalog row {}: {} fields, expected {}",
                    row + 2,
                    record.len(),
                    headers.len()
                );
                skipped += 1;
            }
            Ok(record) => courses.push(columns.course(&record)),
            Err(e) => {
                log::debug!("Skipping unreadable catalog row {}: {e}", row + 2);
                skipped += 1;
            }
        }
    }

    Ok((courses, skipped))
}
