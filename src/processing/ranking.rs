use std::cmp::Ordering;

use crate::domain::course::Course;
use crate::domain::query::{RankedResult, Recommendation, RecommendationQuery};
use crate::processing::embedding::{Encoder, EncoderError, cosine_similarity};

/// Similarities are compared at this many decimal places when sorting.
const SIMILARITY_SORT_SCALE: f64 = 10_000.0;

/// A catalog together with its precomputed title embeddings.
///
/// Built once per process and only read afterwards.
pub struct CatalogIndex {
    courses: Vec<Course>,
    title_embeddings: Vec<Vec<f32>>,
}

impl CatalogIndex {
    /// Encode every course title.
    pub fn build<E>(courses: Vec<Course>, encoder: &mut E) -> Result<Self, EncoderError>
    where
        E: Encoder + ?Sized,
    {
        let title_embeddings = encode_titles(&courses, encoder)?;
        log::info!("Indexed {} course titles", courses.len());
        Ok(Self {
            courses,
            title_embeddings,
        })
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// Rank the catalog against `query` using the cached title embeddings.
    pub fn recommend<E>(
        &self,
        query: &RecommendationQuery,
        encoder: &mut E,
    ) -> Result<Recommendation, EncoderError>
    where
        E: Encoder + ?Sized,
    {
        if query.text().is_empty() {
            return Ok(Recommendation::NoMatch);
        }

        let query_embedding = encoder.encode_one(query.text())?;
        let similarities = similarities(&query_embedding, &self.title_embeddings);
        Ok(rank_by_similarity(&self.courses, &similarities, query))
    }
}

/// Rank `courses` against `query`, encoding every title on each call.
///
/// Prefer [`CatalogIndex`] when the same catalog is queried repeatedly.
pub fn rank<E>(
    query: &RecommendationQuery,
    courses: &[Course],
    encoder: &mut E,
) -> Result<Recommendation, EncoderError>
where
    E: Encoder + ?Sized,
{
    if query.text().is_empty() {
        return Ok(Recommendation::NoMatch);
    }

    let title_embeddings = encode_titles(courses, encoder)?;
    let query_embedding = encoder.encode_one(query.text())?;
    let similarities = similarities(&query_embedding, &title_embeddings);
    Ok(rank_by_similarity(courses, &similarities, query))
}

fn encode_titles<E>(courses: &[Course], encoder: &mut E) -> Result<Vec<Vec<f32>>, EncoderError>
where
    E: Encoder + ?Sized,
{
    let titles: Vec<String> = courses.iter().map(|course| course.title.clone()).collect();
    let embeddings = encoder.encode(&titles)?;
    if embeddings.len() != titles.len() {
        return Err(EncoderError::CountMismatch {
            requested: titles.len(),
            returned: embeddings.len(),
        });
    }
    Ok(embeddings)
}

fn similarities(query_embedding: &[f32], title_embeddings: &[Vec<f32>]) -> Vec<f32> {
    title_embeddings
        .iter()
        .map(|embedding| cosine_similarity(query_embedding, embedding))
        .collect()
}

fn sort_key(similarity: f32, course: &Course) -> (i64, u64) {
    // Exact in f64 for any f32 input; halves round to even.
    let rounded = (f64::from(similarity) * SIMILARITY_SORT_SCALE).round_ties_even() as i64;
    (rounded, course.review_count)
}

/// Rank courses given the query's similarity to each title.
///
/// `similarities[i]` belongs to `courses[i]`. The level filter runs after
/// the list is cut to the desired count, so fewer rows than requested may
/// survive.
pub fn rank_by_similarity(
    courses: &[Course],
    similarities: &[f32],
    query: &RecommendationQuery,
) -> Recommendation {
    let keywords = query.keywords();

    let mut candidates: Vec<(usize, f32)> = courses
        .iter()
        .zip(similarities.iter().copied())
        .enumerate()
        .filter(|(_, (course, similarity))| {
            *similarity >= query.min_similarity() && title_has_keyword(&course.title, &keywords)
        })
        .map(|(index, (_, similarity))| (index, similarity))
        .collect();

    if candidates.is_empty() {
        return fallback(courses, query);
    }

    // Stable: equal keys keep catalog order.
    candidates.sort_by(|&(a, a_similarity), &(b, b_similarity)| -> Ordering {
        sort_key(b_similarity, &courses[b]).cmp(&sort_key(a_similarity, &courses[a]))
    });
    candidates.truncate(query.desired_count());

    let results = candidates
        .into_iter()
        .filter(|&(index, _)| query.level().accepts(&courses[index].level))
        .map(|(index, similarity)| RankedResult {
            course: courses[index].clone(),
            similarity,
        })
        .collect();

    Recommendation::Ranked(results)
}

fn title_has_keyword(title: &str, keywords: &[String]) -> bool {
    let title = title.to_lowercase();
    keywords.iter().any(|keyword| title.contains(keyword.as_str()))
}

/// Substring search over titles, used when no course passes both the
/// similarity threshold and the keyword check.
fn fallback(courses: &[Course], query: &RecommendationQuery) -> Recommendation {
    let needle = query.text().to_lowercase();
    let results: Vec<RankedResult> = courses
        .iter()
        .filter(|course| course.title.to_lowercase().contains(&needle))
        .take(query.desired_count())
        .map(|course| RankedResult {
            course: course.clone(),
            similarity: 0.0,
        })
        .collect();

    if results.is_empty() {
        Recommendation::NoMatch
    } else {
        Recommendation::Fallback(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::LevelFilter;

    /// Every text encodes to the same vector, so all similarities are 1.0.
    struct ConstantEncoder {
        calls: usize,
    }

    impl Encoder for ConstantEncoder {
        fn encode(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncoderError> {
            self.calls += 1;
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    fn course(title: &str, review_count: u64, level: &str) -> Course {
        Course {
            title: title.to_string(),
            price: None,
            review_count,
            level: level.to_string(),
            url: format!("https://www.udemy.com/{}", title.to_lowercase().replace(' ', "-")),
        }
    }

    fn query(text: &str, count: usize, min_similarity: f32, level: &str) -> RecommendationQuery {
        RecommendationQuery::new(text, count, min_similarity, LevelFilter::parse(level))
            .expect("valid query")
    }

    fn titles(recommendation: &Recommendation) -> Vec<&str> {
        recommendation
            .results()
            .iter()
            .map(|result| result.course.title.as_str())
            .collect()
    }

    #[test]
    fn ties_on_similarity_are_broken_by_review_count() {
        let courses = vec![
            course("Python for Beginners", 10, "Beginner"),
            course("Advanced Python", 50, "Expert"),
        ];

        let result = rank_by_similarity(&courses, &[0.9, 0.9], &query("python", 2, 0.0, "all"));

        assert_eq!(titles(&result), vec!["Advanced Python", "Python for Beginners"]);
        assert!(!result.is_fallback());
    }

    #[test]
    fn similarity_is_compared_at_four_decimals() {
        let courses = vec![
            course("Rust A", 1, ""),
            course("Rust B", 9, ""),
            course("Rust C", 100, ""),
        ];

        let result = rank_by_similarity(
            &courses,
            &[0.812_34, 0.812_31, 0.8124],
            &query("rust", 3, 0.0, "all"),
        );

        // A and B round to 0.8123, so B wins on reviews; C rounds higher.
        assert_eq!(titles(&result), vec!["Rust C", "Rust B", "Rust A"]);
    }

    #[test]
    fn equal_keys_keep_catalog_order() {
        let courses = vec![
            course("Go One", 5, ""),
            course("Go Two", 5, ""),
            course("Go Three", 5, ""),
        ];

        let result = rank_by_similarity(&courses, &[0.5, 0.5, 0.5], &query("go", 3, 0.0, "all"));

        assert_eq!(titles(&result), vec!["Go One", "Go Two", "Go Three"]);
    }

    #[test]
    fn candidates_need_threshold_and_keyword() {
        let courses = vec![
            course("Java Basics", 1, ""),
            course("Kotlin Basics", 1, ""),
            course("Java Streams", 1, ""),
        ];

        let result = rank_by_similarity(
            &courses,
            &[0.9, 0.95, 0.3],
            &query("java", 5, 0.4, "all"),
        );

        assert_eq!(titles(&result), vec!["Java Basics"]);
        assert!(result.results().iter().all(|r| r.similarity >= 0.4));
    }

    #[test]
    fn any_query_token_matches_case_insensitively() {
        let courses = vec![course("Learn DJANGO Fast", 1, ""), course("Flask", 1, "")];

        let result = rank_by_similarity(&courses, &[0.8, 0.8], &query("Web Django", 5, 0.1, "all"));

        assert_eq!(titles(&result), vec!["Learn DJANGO Fast"]);
    }

    #[test]
    fn falls_back_to_substring_match_with_zero_similarity() {
        let courses = vec![
            course("Intro to Data Science", 1, "Beginner"),
            course("Cooking", 1, "Beginner"),
            course("Applied Data Science", 500, "Expert"),
            course("data science bootcamp", 3, "Expert"),
        ];

        // Nothing clears the threshold, so the primary path is empty.
        let result = rank_by_similarity(
            &courses,
            &[0.1, 0.1, 0.1, 0.1],
            &query("Data Science", 2, 0.9, "Beginner"),
        );

        assert!(result.is_fallback());
        assert_eq!(
            titles(&result),
            vec!["Intro to Data Science", "Applied Data Science"]
        );
        assert!(result.results().iter().all(|r| r.similarity == 0.0));
    }

    #[test]
    fn no_keyword_and_no_substring_is_no_match() {
        let courses = vec![course("Photography", 1, ""), course("Guitar", 1, "")];

        let result = rank_by_similarity(&courses, &[0.99, 0.99], &query("quantum", 3, 0.0, "all"));

        assert!(result.is_no_match());
        assert!(result.results().is_empty());
    }

    #[test]
    fn level_filter_runs_after_truncation() {
        let courses = vec![
            course("SQL Mastery", 300, "Expert"),
            course("SQL Crash Course", 200, "Expert"),
            course("SQL for Beginners", 100, "Beginner Level"),
        ];

        let result = rank_by_similarity(
            &courses,
            &[0.8, 0.8, 0.8],
            &query("sql", 2, 0.0, "beginner"),
        );

        // The beginner course is ranked third and cut before filtering.
        assert!(matches!(result, Recommendation::Ranked(ref rows) if rows.is_empty()));
        assert!(!result.is_no_match());

        let result = rank_by_similarity(
            &courses,
            &[0.8, 0.8, 0.8],
            &query("sql", 3, 0.0, "BEGINNER"),
        );
        assert_eq!(titles(&result), vec!["SQL for Beginners"]);
    }

    #[test]
    fn result_length_never_exceeds_desired_count() {
        let courses: Vec<Course> = (0..20)
            .map(|i| course(&format!("Excel {i}"), i, ""))
            .collect();
        let similarities = vec![0.7; courses.len()];

        for count in 1..=25 {
            let result =
                rank_by_similarity(&courses, &similarities, &query("excel", count, 0.5, "all"));
            assert!(result.results().len() <= count);
        }
    }

    #[test]
    fn ranked_results_are_non_increasing() {
        let courses: Vec<Course> = (0..12)
            .map(|i| course(&format!("Design {i}"), (i * 7) % 5, ""))
            .collect();
        let similarities: Vec<f32> = (0..12).map(|i| ((i * 13) % 10) as f32 / 10.0).collect();

        let result = rank_by_similarity(&courses, &similarities, &query("design", 12, 0.0, "all"));
        let keys: Vec<(i64, u64)> = result
            .results()
            .iter()
            .map(|r| sort_key(r.similarity, &r.course))
            .collect();

        assert!(keys.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn empty_titles_match_nothing() {
        let courses = vec![course("", 1, "")];

        let result = rank_by_similarity(&courses, &[1.0], &query("rust", 1, 0.0, "all"));

        assert!(result.is_no_match());
    }

    #[test]
    fn half_way_similarities_round_to_even() {
        let courses = vec![course("Go A", 100, ""), course("Go B", 1, "")];

        // 0.40625 keys as 0.4062, below 0.4063, so reviews do not decide.
        let result = rank_by_similarity(
            &courses,
            &[0.406_25, 0.4063],
            &query("go", 2, 0.0, "all"),
        );

        assert_eq!(titles(&result), vec!["Go B", "Go A"]);
        assert_eq!(sort_key(0.406_25, &courses[0]).0, 4062);
        assert_eq!(sort_key(0.468_75, &courses[0]).0, 4688);
    }

    #[test]
    fn empty_query_is_no_match_without_encoding() {
        let courses = vec![course("Rust", 1, "")];
        let mut encoder = ConstantEncoder { calls: 0 };

        let result = rank(&query("", 1, 0.0, "all"), &courses, &mut encoder)
            .expect("ranking should succeed");

        assert!(result.is_no_match());
        assert_eq!(encoder.calls, 0);
    }

    #[test]
    fn whitespace_query_goes_through_fallback() {
        let courses = vec![course("Web Design", 1, ""), course("Rust", 1, "")];
        let mut encoder = ConstantEncoder { calls: 0 };

        let result = rank(&query(" ", 5, 0.4, "all"), &courses, &mut encoder)
            .expect("ranking should succeed");

        assert!(result.is_fallback());
        assert_eq!(titles(&result), vec!["Web Design"]);
        assert!(result.results().iter().all(|r| r.similarity == 0.0));
    }

    #[test]
    fn index_reuses_title_embeddings() {
        let courses = vec![
            course("Python for Beginners", 10, ""),
            course("Advanced Python", 50, ""),
        ];
        let mut encoder = ConstantEncoder { calls: 0 };
        let index = CatalogIndex::build(courses, &mut encoder).expect("index should build");
        assert_eq!(encoder.calls, 1);

        for _ in 0..3 {
            let result = index
                .recommend(&query("python", 2, 0.0, "all"), &mut encoder)
                .expect("ranking should succeed");
            assert_eq!(titles(&result), vec!["Advanced Python", "Python for Beginners"]);
        }
        assert_eq!(encoder.calls, 4);
    }
}
