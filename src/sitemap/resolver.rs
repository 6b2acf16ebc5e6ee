//! Fetching and parsing of individual sitemap documents
//!
//! The resolver performs no retries and no recursion: it fetches exactly one
//! document, classifies it, and hands the extracted locations back. Whether a
//! failure skips the subtree or aborts the site is the caller's decision.

use crate::sitemap::{SitemapKind, SitemapNode};
use crate::ScoutError;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

/// Fetches and parses single sitemap documents
#[derive(Clone)]
pub struct SitemapResolver {
    client: Client,
}

impl SitemapResolver {
    /// Creates a resolver with its own HTTP client
    ///
    /// # Arguments
    ///
    /// * `user_agent` - Default user agent for requests (per-site headers may
    ///   override it)
    /// * `timeout` - Per-request timeout; an elapsed timeout surfaces as
    ///   [`ScoutError::Timeout`] and is not retried here
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client })
    }

    /// Fetches one sitemap document and extracts its locations
    ///
    /// The document's root element decides the kind: a local name ending in
    /// `sitemapindex` makes it an index, anything else a urlset. All `<loc>`
    /// text nodes are collected in document order and trimmed. A document with
    /// zero `<loc>` entries yields an empty node, not an error.
    ///
    /// # Errors
    ///
    /// * [`ScoutError::Timeout`] - request exceeded the configured timeout
    /// * [`ScoutError::Fetch`] - connection or transport failure
    /// * [`ScoutError::HttpStatus`] - non-2xx response
    /// * [`ScoutError::Parse`] - malformed XML
    pub async fn fetch(&self, url: &str, headers: &HeaderMap) -> Result<SitemapNode, ScoutError> {
        let response = self
            .client
            .get(url)
            .headers(headers.clone())
            .send()
            .await
            .map_err(|e| classify_transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScoutError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_transport_error(url, e))?;

        parse_sitemap(url, &body)
    }
}

fn classify_transport_error(url: &str, e: reqwest::Error) -> ScoutError {
    if e.is_timeout() {
        ScoutError::Timeout {
            url: url.to_string(),
        }
    } else {
        ScoutError::Fetch {
            url: url.to_string(),
            source: e,
        }
    }
}

/// Parses sitemap XML into a [`SitemapNode`]
///
/// Matching on local names makes the parser indifferent to the namespace
/// prefix; real-world sitemaps use the sitemaps.org 0.9 namespace but prefix
/// it inconsistently.
pub fn parse_sitemap(source_url: &str, xml: &str) -> Result<SitemapNode, ScoutError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut kind: Option<SitemapKind> = None;
    let mut locations = Vec::new();
    let mut in_loc = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if kind.is_none() {
                    // First start event is the document root.
                    kind = Some(if name.ends_with("sitemapindex") {
                        SitemapKind::Index
                    } else {
                        SitemapKind::Urlset
                    });
                } else if name == "loc" {
                    in_loc = true;
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"loc" {
                    in_loc = false;
                }
            }
            Ok(Event::Text(e)) => {
                if in_loc {
                    let text = e.unescape().map_err(|e| ScoutError::Parse {
                        url: source_url.to_string(),
                        message: e.to_string(),
                    })?;
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        locations.push(trimmed.to_string());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ScoutError::Parse {
                    url: source_url.to_string(),
                    message: e.to_string(),
                })
            }
            _ => {}
        }
        buf.clear();
    }

    let kind = kind.ok_or_else(|| ScoutError::Parse {
        url: source_url.to_string(),
        message: "document has no root element".to_string(),
    })?;

    Ok(SitemapNode {
        source_url: source_url.to_string(),
        kind,
        locations,
    })
}

/// Converts per-site header strings into a reqwest header map
///
/// Invalid header names or values are logged and dropped rather than failing
/// the whole site; they are static config, not data.
pub fn build_header_map(headers: &HashMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => {
                tracing::warn!("Skipping invalid header: {}", name);
            }
        }
    }
    map
}
