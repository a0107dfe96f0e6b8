use feed_rs::model::{Entry, Feed};
use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::{MirrorError, Result};
use crate::domain::{FeedSnapshot, Publisher, RawHeadline};

/// Parse an RSS/Atom/JSON feed document into a snapshot, keeping item order.
pub fn parse_feed(body: &[u8]) -> Result<FeedSnapshot> {
    let feed = parser::parse(body).map_err(|e| MirrorError::FeedParse(e.to_string()))?;

    let publisher = publisher(&feed);
    let headlines = feed.entries.into_iter().map(headline).collect();

    Ok(FeedSnapshot {
        publisher,
        headlines,
    })
}

fn publisher(feed: &Feed) -> Publisher {
    Publisher {
        title: feed
            .title
            .as_ref()
            .map(|t| decode_html_entities(&t.content).to_string()),
        link: feed.links.first().map(|l| l.href.clone()),
        image: feed
            .logo
            .as_ref()
            .or(feed.icon.as_ref())
            .map(|i| i.uri.clone()),
    }
}

fn headline(entry: Entry) -> RawHeadline {
    let published = entry
        .published
        .or(entry.updated)
        .map(|dt| dt.timestamp_millis().to_string())
        .unwrap_or_default();

    let thumbnail = entry
        .media
        .iter()
        .flat_map(|m| m.thumbnails.iter())
        .map(|t| t.image.uri.clone())
        .next();

    RawHeadline {
        title: entry
            .title
            .map(|t| decode_html_entities(&t.content).to_string())
            .unwrap_or_default(),
        published,
        link: entry.links.first().map(|l| l.href.clone()),
        author: entry.authors.first().map(|a| a.name.clone()),
        category: entry.categories.first().map(|c| c.term.clone()),
        thumbnail,
    }
}
