// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod payload;

pub use payload::{SHARING_HINT, extract_envelope, parse_response};

use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use sheetboard_app::{SourceError, Table, TableSource};
use std::time::Duration;
use time::OffsetDateTime;
use tracing::debug;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://docs.google.com";

/// Blocking client for the spreadsheet visualization export endpoint. One
/// client serves every table (sheet tab) of a single spreadsheet.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    sheet_id: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, sheet_id: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            bail!("source.base_url must not be empty");
        }
        let base_url = Url::parse(trimmed)
            .with_context(|| format!("source.base_url {trimmed:?} is not a valid URL"))?;
        if base_url.cannot_be_a_base() {
            bail!("source.base_url {trimmed:?} must be an http(s) URL");
        }

        let sheet_id = sheet_id.trim();
        if sheet_id.is_empty() {
            bail!("source.sheet_id must not be empty -- copy it from the sheet URL");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            sheet_id: sheet_id.to_owned(),
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn sheet_id(&self) -> &str {
        &self.sheet_id
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `cache_buster` is appended as `cb` so intermediaries never serve a
    /// stale copy.
    pub fn table_url(&self, table_id: &str, cache_buster: i64) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["spreadsheets", "d", self.sheet_id.as_str(), "gviz", "tq"]);
        }
        url.query_pairs_mut()
            .clear()
            .append_pair("gid", table_id)
            .append_pair("tqx", "out:json")
            .append_pair("cb", &cache_buster.to_string());
        url
    }

    pub fn fetch_body(&self, table_id: &str) -> Result<String, SourceError> {
        let url = self.table_url(table_id, now_millis());
        debug!(table_id, url = %url, "requesting table");

        let response = self
            .http
            .get(url)
            .send()
            .map_err(|error| connection_error(table_id, &self.base_url, &error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(table_id, status, &body));
        }

        response
            .text()
            .map_err(|error| SourceError::fetch(table_id, format!("read response body: {error}")))
    }
}

impl TableSource for Client {
    fn fetch_table(&self, table_id: &str) -> Result<Table, SourceError> {
        let body = self.fetch_body(table_id)?;
        parse_response(table_id, &body)
    }
}

fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

fn connection_error(table_id: &str, base_url: &Url, error: &reqwest::Error) -> SourceError {
    let host = base_url.host_str().unwrap_or("the spreadsheet host");
    let message = if error.is_timeout() {
        format!("request to {host} timed out -- raise source.timeout or check the network")
    } else {
        format!("cannot reach {host} -- check the network and source.base_url ({error})")
    };
    SourceError::fetch(table_id, message)
}

fn clean_error_response(table_id: &str, status: StatusCode, body: &str) -> SourceError {
    let message = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            format!("server returned {}; {SHARING_HINT}", status.as_u16())
        }
        StatusCode::NOT_FOUND => format!(
            "server returned 404 -- check source.sheet_id and the table id {table_id:?}"
        ),
        _ if body.len() < 100 && !body.contains('<') && !body.trim().is_empty() => {
            format!("server error ({}): {}", status.as_u16(), body.trim())
        }
        _ => format!("server returned {}", status.as_u16()),
    };
    SourceError::fetch(table_id, message)
}
