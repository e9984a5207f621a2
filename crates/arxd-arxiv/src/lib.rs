//! arXiv adapter (reqwest).
//!
//! This crate implements the `arxd-core` PaperIndexPort over the arXiv
//! Atom query API.

use std::time::Duration;

use async_trait::async_trait;

use arxd_core::{
    errors::Error,
    ports::{Paper, PaperIndexPort},
    Result,
};

mod atom;

#[derive(Clone)]
pub struct ArxivClient {
    http: reqwest::Client,
    api_url: String,
}

impl ArxivClient {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::External(format!("http client: {e}")))?;
        Ok(Self {
            http,
            api_url: api_url.into(),
        })
    }
}

#[async_trait]
impl PaperIndexPort for ArxivClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Paper>> {
        let max = max_results.to_string();
        let resp = self
            .http
            .get(&self.api_url)
            .query(&[
                ("search_query", query),
                ("start", "0"),
                ("max_results", max.as_str()),
                ("sortBy", "submittedDate"),
                ("sortOrder", "descending"),
            ])
            .send()
            .await
            .map_err(|e| Error::External(format!("arxiv request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::External(format!(
                "arxiv query failed: HTTP {status}"
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::External(format!("arxiv response read failed: {e}")))?;

        let mut papers = atom::parse_feed(&body);
        papers.truncate(max_results);
        Ok(papers)
    }
}
