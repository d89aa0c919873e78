//! Declarative descriptions of the backend API calls
//!
//! Each logical operation maps to an HTTP method, a list of path segments and
//! query parameters. Descriptors know nothing about the host: they are resolved
//! against the configured base URL by the request executor, which percent-encodes
//! every segment so user text can never alter the path structure.

use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub type HeadersMap = BTreeMap<String, String>;

/// Query parameter carrying the API key on every call
pub const API_KEY_PARAM: &str = "api_key";

const REDACTED_BASE: &str = "http://redacted.invalid/";

/// A descriptor that cannot be turned into a URL
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EndpointError {
    /// `.` and `..` are dropped or resolved by URL parsers, so they can never
    /// reach the server as a literal path segment
    #[error("Path segment {0:?} cannot be sent")]
    DotSegment(String),

    #[error("Base URL {0} cannot take a path")]
    CannotBeABase(String),
}

/// Field the backend searches on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    #[default]
    AlbumTitle,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::AlbumTitle => "album_title",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Search,
    GetAlbum,
    GetBand,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Search => "search",
            OperationKind::GetAlbum => "get_album",
            OperationKind::GetBand => "get_band",
        }
    }
}

/// A logical backend operation with its caller-supplied arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Search { search_type: SearchType, word: String },
    Album { album_id: u64 },
    Band { band_id: u64 },
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Search { .. } => OperationKind::Search,
            Operation::Album { .. } => OperationKind::GetAlbum,
            Operation::Band { .. } => OperationKind::GetBand,
        }
    }

    /// Build the descriptor for this operation. Pure and infallible.
    pub fn describe(&self, api_key: &str) -> EndpointDescriptor {
        let segments = match self {
            Operation::Search { search_type, word } => vec![
                "search".to_string(),
                search_type.as_str().to_string(),
                word.clone(),
            ],
            Operation::Album { album_id } => vec!["album".to_string(), album_id.to_string()],
            Operation::Band { band_id } => vec!["band".to_string(), band_id.to_string()],
        };

        EndpointDescriptor {
            operation: self.clone(),
            // every operation of this API is a POST
            method: Method::POST,
            segments,
            query: vec![(API_KEY_PARAM.to_string(), api_key.to_string())],
            headers: HeadersMap::new(),
        }
    }
}

/// Immutable description of one HTTP call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub operation: Operation,
    pub method: Method,
    /// Unencoded path segments appended to the base URL path
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    /// Per-call headers, applied after the shared ones
    pub headers: HeadersMap,
}

impl EndpointDescriptor {
    pub fn kind(&self) -> OperationKind {
        self.operation.kind()
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Resolve against a base URL, keeping the base path (e.g. `/api`).
    ///
    /// Fails rather than send a URL with fewer segments than described.
    pub fn url(&self, base: &Url) -> Result<Url, EndpointError> {
        if let Some(segment) = self.segments.iter().find(|s| is_dot_segment(s)) {
            return Err(EndpointError::DotSegment(segment.clone()));
        }

        let mut url = base.clone();
        url.set_query(None);
        url.set_fragment(None);

        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| EndpointError::CannotBeABase(base.to_string()))?;
            path.pop_if_empty();
            path.extend(self.segments.iter().map(String::as_str));
        }

        if !self.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        Ok(url)
    }

    /// Encoded path and query with the API key masked, for log lines
    pub fn redacted_path(&self) -> String {
        let mut redacted = self.clone();
        for (key, value) in redacted.query.iter_mut() {
            if key == API_KEY_PARAM {
                *value = "***".to_string();
            }
        }

        let resolved = Url::parse(REDACTED_BASE)
            .ok()
            .and_then(|base| redacted.url(&base).ok());

        match resolved {
            Some(url) => match url.query() {
                Some(query) => format!("{}?{}", url.path(), query),
                None => url.path().to_string(),
            },
            None => format!("/{}", self.segments.join("/")),
        }
    }
}

/// Segments `PathSegmentsMut` skips instead of encoding
fn is_dot_segment(segment: &str) -> bool {
    matches!(segment, "." | "..")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://localhost/api").unwrap()
    }

    #[test]
    fn test_search_descriptor() {
        let descriptor = Operation::Search {
            search_type: SearchType::AlbumTitle,
            word: "master".to_string(),
        }
        .describe("key-1");

        assert_eq!(descriptor.kind(), OperationKind::Search);
        assert_eq!(descriptor.method, Method::POST);
        assert_eq!(
            descriptor.url(&base()).unwrap().as_str(),
            "http://localhost/api/search/album_title/master?api_key=key-1"
        );
    }

    #[test]
    fn test_album_and_band_descriptors() {
        let album = Operation::Album { album_id: 42 }.describe("k");
        assert_eq!(album.kind(), OperationKind::GetAlbum);
        assert_eq!(
            album.url(&base()).unwrap().as_str(),
            "http://localhost/api/album/42?api_key=k"
        );

        let band = Operation::Band { band_id: 7 }.describe("k");
        assert_eq!(band.kind(), OperationKind::GetBand);
        assert_eq!(band.method, Method::POST);
        assert_eq!(band.url(&base()).unwrap().as_str(), "http://localhost/api/band/7?api_key=k");
    }

    #[test]
    fn test_user_text_is_percent_encoded() {
        let descriptor = Operation::Search {
            search_type: SearchType::AlbumTitle,
            word: "ride the/lightning?x=1#top".to_string(),
        }
        .describe("k");

        let url = descriptor.url(&base()).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost/api/search/album_title/ride%20the%2Flightning%3Fx=1%23top?api_key=k"
        );
        assert_eq!(url.path_segments().unwrap().count(), 4);
        assert_eq!(url.query(), Some("api_key=k"));
    }

    #[test]
    fn test_non_ascii_word() {
        let descriptor = Operation::Search {
            search_type: SearchType::AlbumTitle,
            word: "Motörhead".to_string(),
        }
        .describe("k");

        assert_eq!(
            descriptor.url(&base()).unwrap().path(),
            "/api/search/album_title/Mot%C3%B6rhead"
        );
    }

    #[test]
    fn test_base_with_trailing_slash_and_query() {
        let base = Url::parse("https://example.com/v1/?stale=1").unwrap();
        let descriptor = Operation::Band { band_id: 3 }.describe("secret&key");

        assert_eq!(
            descriptor.url(&base).unwrap().as_str(),
            "https://example.com/v1/band/3?api_key=secret%26key"
        );
    }

    #[test]
    fn test_redacted_path_hides_api_key() {
        let descriptor = Operation::Search {
            search_type: SearchType::AlbumTitle,
            word: "black album".to_string(),
        }
        .describe("super-secret");

        let path = descriptor.redacted_path();
        assert_eq!(path, "/search/album_title/black%20album?api_key=***");
        assert!(!path.contains("super-secret"));
    }

    #[test]
    fn test_dot_words_are_refused() {
        for word in [".", ".."] {
            let descriptor = Operation::Search {
                search_type: SearchType::AlbumTitle,
                word: word.to_string(),
            }
            .describe("k");

            assert_eq!(
                descriptor.url(&base()),
                Err(EndpointError::DotSegment(word.to_string()))
            );
            assert_eq!(
                descriptor.redacted_path(),
                format!("/search/album_title/{}", word)
            );
        }
    }

    #[test]
    fn test_words_containing_dots_keep_their_segment() {
        for (word, encoded) in [("...", "..."), ("..x", "..x"), ("%2e", "%252e")] {
            let url = Operation::Search {
                search_type: SearchType::AlbumTitle,
                word: word.to_string(),
            }
            .describe("k")
            .url(&base())
            .unwrap();

            assert_eq!(url.path_segments().unwrap().count(), 4);
            assert_eq!(url.path(), format!("/api/search/album_title/{}", encoded));
        }
    }

    #[test]
    fn test_cannot_be_a_base_url_is_refused() {
        let base = Url::parse("mailto:someone@example.com").unwrap();
        let descriptor = Operation::Band { band_id: 1 }.describe("k");

        assert!(matches!(
            descriptor.url(&base),
            Err(EndpointError::CannotBeABase(_))
        ));
    }

    #[test]
    fn test_with_header() {
        let descriptor = Operation::Album { album_id: 1 }
            .describe("k")
            .with_header("X-Trace", "abc");

        assert_eq!(descriptor.headers.get("X-Trace").map(String::as_str), Some("abc"));
    }
}
