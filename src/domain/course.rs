use serde::Serialize;

/// A single catalog row. Identity is its position in the catalog.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Course {
    pub title: String,
    /// `None` when the source value was missing, non-numeric or NaN.
    pub price: Option<f64>,
    pub review_count: u64,
    pub level: String,
    pub url: String,
}

impl Course {
    /// Parse a raw price cell. Anything that is not a finite number is free.
    pub fn parse_price(raw: &str) -> Option<f64> {
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
    }

    /// Coerce a raw review cell to a count, defaulting to 0.
    ///
    /// Fractional values are truncated, negative and unparseable values
    /// become 0.
    pub fn parse_review_count(raw: &str) -> u64 {
        let raw = raw.trim();
        if let Ok(value) = raw.parse::<u64>() {
            return value;
        }
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => value.trunc() as u64,
            _ => 0,
        }
    }

    /// Format the price as a currency string, or `free_label` when there is
    /// no numeric price.
    pub fn formatted_price(&self, currency_symbol: &str, free_label: &str) -> String {
        match self.price {
            Some(price) => format!("{currency_symbol}{price:.2}"),
            None => free_label.to_string(),
        }
    }

    pub fn platform(&self) -> Platform {
        Platform::from_url(&self.url)
    }
}

/// Hosting platform inferred from a course URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Platform {
    YouTube,
    Udemy,
    Other,
}

impl Platform {
    pub fn from_url(url: &str) -> Self {
        if url.contains("youtube.com") {
            Platform::YouTube
        } else if url.contains("udemy.com") {
            Platform::Udemy
        } else {
            Platform::Other
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Platform::YouTube => "YouTube",
            Platform::Udemy => "Udemy",
            Platform::Other => "Other",
        }
    }
}
