use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::app::{MirrorError, Result};
use crate::domain::key::derive_key;
use crate::domain::{Publisher, RawHeadline};

/// Display pattern for `publishedDate`, e.g. `Tue, 14 Nov 2023 10:13 pm +00:00`.
pub const PUBLISHED_DATE_FORMAT: &str = "%a, %d %b %Y %I:%M %P %:z";

/// The record persisted for every headline.
///
/// Field order is the serialization order; the stored bytes are compared
/// verbatim, so reordering fields rewrites every entry on the next cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub title: String,
    pub published: i64,
    pub published_date: String,
    pub link: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub thumbnail: Option<String>,
    pub publisher: Publisher,
}

impl FeedEntry {
    /// Build the persisted record from a raw headline.
    pub fn from_headline(headline: &RawHeadline, publisher: &Publisher, tz: Tz) -> Result<Self> {
        let published = parse_published(&headline.published)?;
        let published_date = format_published(published, tz)?;

        Ok(Self {
            title: headline.title.clone(),
            published,
            published_date,
            link: headline.link.clone(),
            author: headline.author.clone(),
            category: headline.category.clone(),
            thumbnail: headline.thumbnail.clone(),
            publisher: publisher.clone(),
        })
    }

    pub fn key(&self, prefix: &str) -> String {
        derive_key(prefix, &self.published.to_string(), &self.title)
    }

    /// Canonical byte encoding stored in the drive.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Coerce the textual timestamp to epoch milliseconds.
///
/// Integral values are taken as-is; fractional ones (`"1700000000000.0"`)
/// are truncated toward zero.
pub fn parse_published(raw: &str) -> Result<i64> {
    let trimmed = raw.trim();
    if let Ok(ms) = trimmed.parse::<i64>() {
        return Ok(ms);
    }
    match trimmed.parse::<f64>() {
        Ok(ms) if ms.is_finite() => Ok(ms.trunc() as i64),
        _ => Err(MirrorError::InvalidTimestamp(raw.to_string())),
    }
}

pub fn format_published(published_ms: i64, tz: Tz) -> Result<String> {
    let utc: DateTime<Utc> = Utc
        .timestamp_millis_opt(published_ms)
        .single()
        .ok_or_else(|| MirrorError::InvalidTimestamp(published_ms.to_string()))?;

    Ok(utc.with_timezone(&tz).format(PUBLISHED_DATE_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::key::FEED_PREFIX;

    fn publisher() -> Publisher {
        Publisher {
            title: Some("Example News".into()),
            link: Some("https://example.com".into()),
            image: None,
        }
    }

    #[test]
    fn test_from_headline_coerces_published() {
        let mut headline = RawHeadline::new("1700000000000", "Breaking: Big News!");
        headline.link = Some("https://example.com/big".into());

        let entry = FeedEntry::from_headline(&headline, &publisher(), Tz::UTC).unwrap();
        assert_eq!(entry.published, 1_700_000_000_000);
        assert_eq!(entry.published_date, "Tue, 14 Nov 2023 10:13 pm +00:00");
        assert_eq!(entry.publisher, publisher());
        assert_eq!(
            entry.key(FEED_PREFIX),
            "/feed/1700000000000-breaking-big-news-"
        );
    }

    #[test]
    fn test_published_date_respects_timezone() {
        let tz: Tz = "Asia/Tokyo".parse().unwrap();
        assert_eq!(
            format_published(1_700_000_000_000, tz).unwrap(),
            "Wed, 15 Nov 2023 07:13 am +09:00"
        );
    }

    #[test]
    fn test_invalid_published_fails_item() {
        let headline = RawHeadline::new("yesterday", "Stale");
        let err = FeedEntry::from_headline(&headline, &publisher(), Tz::UTC).unwrap_err();
        assert!(matches!(err, MirrorError::InvalidTimestamp(_)));
    }

    #[test]
    fn test_empty_published_fails_item() {
        assert!(parse_published("").is_err());
    }

    #[test]
    fn test_fractional_published_truncates() {
        assert_eq!(parse_published(" 1000.9 ").unwrap(), 1000);
    }

    #[test]
    fn test_serialization_uses_camel_case_in_field_order() {
        let headline = RawHeadline::new("1000", "Hello World");
        let entry = FeedEntry::from_headline(&headline, &Publisher::default(), Tz::UTC).unwrap();
        let json = String::from_utf8(entry.to_bytes().unwrap()).unwrap();

        assert!(json.starts_with(
            r#"{"title":"Hello World","published":1000,"publishedDate":"Thu, 01 Jan 1970 12:00 am +00:00","link":null"#
        ));
        assert!(json.ends_with(r#""publisher":{"title":null,"link":null,"image":null}}"#));
    }
}
