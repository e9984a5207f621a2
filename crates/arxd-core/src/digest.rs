//! Digest generation: boolean-OR query from a chat's filters, one query to
//! the paper index, Telegram-HTML rendering of the results.

use chrono::NaiveDate;

use crate::{
    formatting::escape_html,
    ports::{Paper, PaperIndexPort},
    store::ChatConfig,
    Result,
};

/// Outcome of a digest run for one chat.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Digest {
    /// Both filter lists are empty; no query was issued.
    Empty,
    /// The index returned nothing for the query.
    NoResults,
    Found(Vec<Paper>),
}

/// Build the index query for a chat, or `None` when nothing is configured.
///
/// Author terms match the author field; keyword terms match title or
/// abstract; everything is OR-ed together.
pub fn build_query(config: &ChatConfig) -> Option<String> {
    let mut terms = Vec::new();
    for author in &config.authors {
        terms.push(format!("au:\"{author}\""));
    }
    for keyword in &config.keywords {
        terms.push(format!("ti:\"{keyword}\" OR abs:\"{keyword}\""));
    }
    if terms.is_empty() {
        return None;
    }
    Some(terms.join(" OR "))
}

pub async fn build_digest(
    index: &dyn PaperIndexPort,
    config: &ChatConfig,
    max_results: usize,
) -> Result<Digest> {
    let Some(query) = build_query(config) else {
        return Ok(Digest::Empty);
    };

    let papers = index.search(&query, max_results).await?;
    if papers.is_empty() {
        return Ok(Digest::NoResults);
    }
    Ok(Digest::Found(papers))
}

/// Render the digest message: a count/date header, then one ranked line per
/// paper with a linked title, first author and submission date.
pub fn render_digest(papers: &[Paper], today: NaiveDate) -> String {
    let mut lines = Vec::with_capacity(papers.len() + 1);
    lines.push(format!(
        "Last submitted {} papers for {}\n",
        papers.len(),
        today.format("%d-%m-%Y")
    ));

    for (idx, paper) in papers.iter().enumerate() {
        lines.push(format!(
            "<b>{}. <a href=\"{}\">{}</a></b> - {} et al. ({})",
            idx + 1,
            paper.link,
            escape_html(&paper.title),
            escape_html(&paper.first_author),
            paper.published.format("%d-%m-%Y")
        ));
    }

    lines.join("\n")
}
