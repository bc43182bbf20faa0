use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::processing::recommendation::RecommendationRow;

/// Render a recommendation as a self-contained HTML card.
///
/// Every interpolated value is escaped, so titles and URLs from the catalog
/// cannot inject markup.
pub fn course_card_html(row: &RecommendationRow) -> String {
    let title = encode_text(&row.title);
    let price = encode_text(&row.price);
    let platform = row.platform.label();
    let url = encode_double_quoted_attribute(&row.url);

    format!(
        r#"<div class="course-card">
    <div class="course-card__title">{title}</div>
    <p><strong>Similarity:</strong> {similarity:.2}</p>
    <p><strong>Price:</strong> {price}</p>
    <p><strong>Reviews:</strong> {reviews}</p>
    <p><strong>Platform:</strong> {platform}</p>
    <a href="{url}" target="_blank" rel="noopener"><button class="course-card__link">Go to course ({platform})</button></a>
</div>"#,
        similarity = row.similarity,
        reviews = row.review_count,
    )
}
