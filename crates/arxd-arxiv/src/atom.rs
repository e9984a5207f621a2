//! Minimal Atom feed scanner for arXiv query responses.
//!
//! The feed grammar we consume is small and fixed (one `<entry>` per paper
//! with `title`, `author/name`, `published`, `link`), so we scan it by hand
//! instead of pulling in an XML dependency.

use chrono::{DateTime, Utc};

use arxd_core::ports::Paper;

/// Extract every well-formed `<entry>` from an Atom payload. Malformed
/// entries are logged and skipped; the rest of the feed is still used.
pub(crate) fn parse_feed(xml: &str) -> Vec<Paper> {
    let mut papers = Vec::new();
    let mut rest = xml;

    while let Some(start) = rest.find("<entry>") {
        let after = &rest[start + "<entry>".len()..];
        let Some(end) = after.find("</entry>") else {
            break;
        };
        let entry = &after[..end];
        match parse_entry(entry) {
            Some(paper) => papers.push(paper),
            None => eprintln!("[ARXIV] Skipping malformed feed entry"),
        }
        rest = &after[end + "</entry>".len()..];
    }

    papers
}

fn parse_entry(entry: &str) -> Option<Paper> {
    let title = collapse_ws(&unescape(&tag_text(entry, "title")?));
    if title.is_empty() {
        return None;
    }

    let published = tag_text(entry, "published")?;
    let published = DateTime::parse_from_rfc3339(published.trim())
        .ok()?
        .with_timezone(&Utc);

    // First listed author only; the digest renders "X et al.".
    let author_block = tag_text(entry, "author")?;
    let first_author = collapse_ws(&unescape(&tag_text(author_block, "name")?));
    if first_author.is_empty() {
        return None;
    }

    let link = alternate_link(entry)
        .or_else(|| tag_text(entry, "id").map(|l| unescape(l.trim())))?;

    Some(Paper {
        title,
        link,
        first_author,
        published,
    })
}

/// Content of the first `<tag ...>...</tag>` occurrence, inner markup
/// included. Skips tags whose name merely starts with `tag`.
fn tag_text<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");

    let mut rest = xml;
    while let Some(start) = rest.find(&open) {
        let after_open = &rest[start + open.len()..];
        let first = *after_open.as_bytes().first()?;
        if first != b'>' && !first.is_ascii_whitespace() {
            rest = after_open;
            continue;
        }
        let gt = after_open.find('>')?;
        let content_start = gt + 1;
        let end = after_open[content_start..].find(&close)?;
        return Some(&after_open[content_start..content_start + end]);
    }
    None
}

/// `href` of the `<link rel="alternate" .../>` element, the paper's
/// canonical abstract page.
fn alternate_link(entry: &str) -> Option<String> {
    let mut rest = entry;
    while let Some(start) = rest.find("<link") {
        let after = &rest[start..];
        let Some(end) = after.find('>') else {
            break;
        };
        let attrs = &after[..end];
        if attrs.contains(r#"rel="alternate""#) {
            if let Some(href) = attr_value(attrs, "href") {
                return Some(unescape(href));
            }
        }
        rest = &after[end + 1..];
    }
    None
}

fn attr_value<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!("{name}=\"");
    let start = attrs.find(&needle)? + needle.len();
    let end = attrs[start..].find('"')?;
    Some(&attrs[start..start + end])
}

fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: search_query=ti:"quantum"</title>
  <id>http://arxiv.org/api/abc</id>
  <opensearch:totalResults xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/">2</opensearch:totalResults>
  <entry>
    <id>http://arxiv.org/abs/2401.00001v1</id>
    <updated>2026-01-16T01:00:00Z</updated>
    <published>2026-01-15T18:30:00Z</published>
    <title>Quantum Widgets &amp; Their
      Applications</title>
    <summary>We study widgets.</summary>
    <author>
      <name>Alice Smith</name>
    </author>
    <author>
      <name>Bob Jones</name>
    </author>
    <link href="http://arxiv.org/abs/2401.00001v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2401.00001v1" rel="related" type="application/pdf"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2401.00002v1</id>
    <published>2026-01-14T09:00:00Z</published>
    <title>A Second Paper</title>
    <author>
      <name>Carol D&apos;Souza</name>
    </author>
  </entry>
</feed>"#;

    #[test]
    fn parses_entries_with_entities_and_multiline_titles() {
        let papers = parse_feed(FEED);
        assert_eq!(papers.len(), 2);

        let first = &papers[0];
        assert_eq!(first.title, "Quantum Widgets & Their Applications");
        assert_eq!(first.first_author, "Alice Smith");
        assert_eq!(first.link, "http://arxiv.org/abs/2401.00001v1");
        assert_eq!(
            first.published,
            Utc.with_ymd_and_hms(2026, 1, 15, 18, 30, 0).unwrap()
        );
    }

    #[test]
    fn falls_back_to_entry_id_when_no_alternate_link() {
        let papers = parse_feed(FEED);
        assert_eq!(papers[1].link, "http://arxiv.org/abs/2401.00002v1");
        assert_eq!(papers[1].first_author, "Carol D'Souza");
        assert_eq!(papers[1].published.day(), 14);
    }

    #[test]
    fn empty_feed_yields_no_papers() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>empty</title></feed>"#;
        assert!(parse_feed(xml).is_empty());
    }

    #[test]
    fn entry_without_author_is_skipped() {
        let xml = r#"<feed><entry>
            <id>http://arxiv.org/abs/1</id>
            <published>2026-01-01T00:00:00Z</published>
            <title>No Author</title>
        </entry></feed>"#;
        assert!(parse_feed(xml).is_empty());
    }

    #[test]
    fn entry_with_bad_date_is_skipped() {
        let xml = r#"<feed><entry>
            <id>http://arxiv.org/abs/1</id>
            <published>yesterday</published>
            <title>Bad Date</title>
            <author><name>A</name></author>
        </entry></feed>"#;
        assert!(parse_feed(xml).is_empty());
    }

    #[test]
    fn tag_text_does_not_match_tag_name_prefixes() {
        // `<titlefoo>` must not satisfy a lookup for `title`.
        let xml = "<titlefoo>bad</titlefoo><title>good</title>";
        assert_eq!(tag_text(xml, "title"), Some("good"));
    }
}
