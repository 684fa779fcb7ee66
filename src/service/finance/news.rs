use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use finance_query_core::{YahooError, YahooFinanceClient};
use futures_util::future::join_all;
use serde_json::Value;
use tracing::warn;

use crate::models::NewsItem;

/// Search terms that surface broad-market headlines.
pub const MARKET_NEWS_QUERIES: [&str; 3] = ["^GSPC", "^IXIC", "^DJI"];

/// Fetch news items for a symbol via Yahoo search.
pub async fn fetch_news(
    client: &YahooFinanceClient,
    symbol: &str,
    limit: usize,
) -> Result<Vec<NewsItem>, YahooError> {
    let data = client.search(symbol, limit).await?;
    let mut items = parse_news(&data);
    sort_newest_first(&mut items);
    items.truncate(limit);
    Ok(items)
}

/// Merge headlines for the major indices, dropping duplicate links.
///
/// Fails only when every query fails; a partial outage still yields news.
pub async fn fetch_market_news(
    client: &YahooFinanceClient,
    limit: usize,
) -> Result<Vec<NewsItem>, YahooError> {
    let results = join_all(
        MARKET_NEWS_QUERIES
            .iter()
            .map(|query| client.search(*query, limit)),
    )
    .await;

    let mut batches = Vec::new();
    let mut last_err = None;
    for (query, result) in MARKET_NEWS_QUERIES.iter().zip(results) {
        match result {
            Ok(data) => batches.push(parse_news(&data)),
            Err(err) => {
                warn!("Market news search for {} failed: {}", query, err);
                last_err = Some(err);
            }
        }
    }

    if batches.is_empty() {
        if let Some(err) = last_err {
            return Err(err);
        }
    }

    Ok(merge_batches(batches, limit))
}

fn merge_batches(batches: Vec<Vec<NewsItem>>, limit: usize) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    let mut items: Vec<NewsItem> = batches
        .into_iter()
        .flatten()
        .filter(|item| seen.insert(item.link.clone()))
        .collect();
    sort_newest_first(&mut items);
    items.truncate(limit);
    items
}

fn parse_news(data: &Value) -> Vec<NewsItem> {
    let empty = Vec::new();
    let news = data.get("news").and_then(|n| n.as_array()).unwrap_or(&empty);

    news.iter()
        .filter_map(|item| {
            let title = item.get("title").and_then(|v| v.as_str())?.trim();
            let link = item.get("link").and_then(|v| v.as_str())?.trim();
            if title.is_empty() || link.is_empty() {
                return None;
            }

            let source = item
                .get("publisher")
                .or_else(|| item.get("provider"))
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());

            let published_at = item
                .get("providerPublishTime")
                .and_then(|v| v.as_i64())
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0));

            let thumbnail = item
                .get("thumbnail")
                .and_then(|t| t.get("resolutions"))
                .and_then(|r| r.as_array())
                .and_then(|arr| arr.first())
                .and_then(|r| r.get("url"))
                .and_then(|u| u.as_str())
                .map(|s| s.to_string());

            Some(NewsItem {
                title: title.to_string(),
                link: link.to_string(),
                source,
                published_at,
                thumbnail,
            })
        })
        .collect()
}

// Undated items sink to the bottom.
fn sort_newest_first(items: &mut [NewsItem]) {
    items.sort_by(|a, b| match (a.published_at, b.published_at) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(title: &str, link: &str, ts: Option<i64>) -> NewsItem {
        NewsItem {
            title: title.into(),
            link: link.into(),
            source: None,
            published_at: ts.and_then(|t| DateTime::<Utc>::from_timestamp(t, 0)),
            thumbnail: None,
        }
    }

    #[test]
    fn parses_search_payload() {
        let data = json!({
            "news": [
                {
                    "title": " Stocks rally ",
                    "link": "https://example.com/a",
                    "publisher": "Reuters",
                    "providerPublishTime": 1738159800,
                    "thumbnail": { "resolutions": [{ "url": "https://img/1.jpg" }] }
                },
                { "title": "", "link": "https://example.com/b" },
                { "title": "No link" }
            ]
        });

        let items = parse_news(&data);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Stocks rally");
        assert_eq!(items[0].source.as_deref(), Some("Reuters"));
        assert_eq!(items[0].thumbnail.as_deref(), Some("https://img/1.jpg"));
    }

    #[test]
    fn missing_news_array_is_empty() {
        assert!(parse_news(&json!({ "quotes": [] })).is_empty());
    }

    #[test]
    fn merges_dedupes_and_orders() {
        let batches = vec![
            vec![item("a", "l1", Some(100)), item("b", "l2", None)],
            vec![item("a again", "l1", Some(100)), item("c", "l3", Some(300))],
        ];

        let merged = merge_batches(batches, 10);
        let titles: Vec<&str> = merged.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "a", "b"]);

        let batches = vec![vec![item("a", "l1", Some(1)), item("b", "l2", Some(2))]];
        assert_eq!(merge_batches(batches, 1).len(), 1);
    }
}
