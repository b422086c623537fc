use anyhow::Result;
use chrono::SecondsFormat;
use feed_rs::parser;

use super::item::{Item, Person};

/// Parse RSS/Atom bytes into items, preserving document order.
///
/// Feeds are expected to list their newest entry first; no reordering is
/// done here.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<Item>> {
    let feed = parser::parse(bytes)?;

    let items = feed
        .entries
        .into_iter()
        .map(|entry| {
            let title = entry.title.map(|t| t.content).unwrap_or_default();
            let link = entry.links.first().map(|l| l.href.clone());
            let author = entry.authors.into_iter().next().map(|p| Person {
                name: p.name,
                email: p.email,
            });
            let published = entry
                .published
                .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true));
            let updated = entry
                .updated
                .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true));

            Item {
                title,
                author,
                link,
                published,
                updated,
            }
        })
        .collect();

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Commits</title>
  <id>urn:commits</id>
  <updated>2024-03-02T10:00:00Z</updated>
  <entry>
    <id>urn:c</id>
    <title>C</title>
    <link href="https://example.com/c"/>
    <author><name>Ada</name><email>ada@example.com</email></author>
    <updated>2024-03-02T10:00:00Z</updated>
    <published>2024-03-02T09:00:00Z</published>
  </entry>
  <entry>
    <id>urn:b</id>
    <title>B</title>
    <link href="https://example.com/b"/>
    <updated>2024-03-01T10:00:00Z</updated>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_atom_keeps_order_and_fields() {
        let items = parse_feed(ATOM.as_bytes()).unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].title, "C");
        assert_eq!(items[0].link.as_deref(), Some("https://example.com/c"));
        assert_eq!(items[0].updated.as_deref(), Some("2024-03-02T10:00:00Z"));
        assert_eq!(items[0].published.as_deref(), Some("2024-03-02T09:00:00Z"));
        assert_eq!(
            items[0].author,
            Some(Person {
                name: "Ada".into(),
                email: Some("ada@example.com".into()),
            })
        );

        assert_eq!(items[1].title, "B");
        assert!(items[1].author.is_none());
        assert!(items[1].published.is_none());
    }

    #[test]
    fn test_parse_rss_item_without_title() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>t</title>
    <item><guid>1</guid><link>https://example.com/1</link><description>body</description></item>
</channel></rss>"#;
        let items = parse_feed(rss.as_bytes()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "");
        assert_eq!(items[0].link.as_deref(), Some("https://example.com/1"));
    }

    #[test]
    fn test_parse_empty_channel() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>t</title></channel></rss>"#;
        assert!(parse_feed(rss.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_feed(b"<not valid xml").is_err());
    }
}
