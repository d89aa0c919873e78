//! Album and band lookups
//!
//! An album only references its band, so showing band details for an album
//! takes two calls: the album lookup yields `data.band.id`, the band lookup
//! yields the band's `details` and `discography`.

use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::client::{Executor, RequestContext, TransportError};
use crate::endpoint::Operation;
use crate::response::{DATA_KEY, ErrorDocument, ResponseInterpreter};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DetailError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Server error {}: {}", .0.status_code, .0.message_friendly)]
    Server(ErrorDocument),

    #[error("Album {album_id} has no band id")]
    MissingBand { album_id: u64 },

    #[error("invalid band id {band_id}")]
    InvalidBand { band_id: u64 },
}

pub type Result<T> = std::result::Result<T, DetailError>;

/// Band page contents
#[derive(Debug, Clone, PartialEq)]
pub struct BandDetail {
    pub band_id: u64,
    pub details: Map<String, Value>,
    pub discography: Vec<Value>,
    pub photo: Option<String>,
}

impl BandDetail {
    /// Read a band out of a lookup's `data` object.
    ///
    /// A band without any `details` is treated as unknown.
    pub fn from_data(band_id: u64, data: &Value) -> Result<Self> {
        let details = data
            .get("details")
            .and_then(Value::as_object)
            .filter(|details| !details.is_empty())
            .cloned()
            .ok_or(DetailError::InvalidBand { band_id })?;

        let discography = data
            .get("discography")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let photo = data.get("photo").and_then(Value::as_str).map(str::to_string);

        Ok(Self {
            band_id,
            details,
            discography,
            photo,
        })
    }

    pub fn genre(&self) -> Option<&str> {
        self.detail("genre")
    }

    pub fn country(&self) -> Option<&str> {
        self.detail("country of origin")
    }

    pub fn years_active(&self) -> Option<&str> {
        self.detail("years active")
    }

    fn detail(&self, key: &str) -> Option<&str> {
        self.details.get(key).and_then(Value::as_str)
    }
}

/// `data.band.id` as a number, accepting numeric strings
pub fn band_id_of(document: &Value) -> Option<u64> {
    match document.pointer("/data/band/id")? {
        Value::Number(id) => id.as_u64(),
        Value::String(id) => id.trim().parse().ok(),
        _ => None,
    }
}

pub struct DetailController {
    executor: Arc<dyn Executor>,
    context: Arc<RequestContext>,
    interpreter: Arc<ResponseInterpreter>,
}

impl DetailController {
    pub fn new(
        executor: Arc<dyn Executor>,
        context: Arc<RequestContext>,
        interpreter: Arc<ResponseInterpreter>,
    ) -> Self {
        Self {
            executor,
            context,
            interpreter,
        }
    }

    /// Id of the band that released `album_id`
    pub async fn album_band_id(&self, album_id: u64) -> Result<u64> {
        let document = self.lookup(Operation::Album { album_id }).await?;
        let band_id = band_id_of(&document).ok_or(DetailError::MissingBand { album_id })?;
        debug!(album_id, band_id, "Resolved album band");
        Ok(band_id)
    }

    pub async fn band(&self, band_id: u64) -> Result<BandDetail> {
        let document = self.lookup(Operation::Band { band_id }).await?;
        let data = document.get(DATA_KEY).cloned().unwrap_or(Value::Null);
        let band = BandDetail::from_data(band_id, &data)?;
        info!(
            band_id,
            releases = band.discography.len(),
            "Band loaded"
        );
        Ok(band)
    }

    /// Album lookup followed by the band lookup
    pub async fn band_for_album(&self, album_id: u64) -> Result<BandDetail> {
        let band_id = self.album_band_id(album_id).await?;
        self.band(band_id).await
    }

    async fn lookup(&self, operation: Operation) -> Result<Value> {
        let descriptor = self.context.describe(&operation);
        let raw = self.executor.execute(&descriptor).await?;
        let document = self.interpreter.interpret(&raw, true);

        match ErrorDocument::from_document(&document) {
            Some(error) => Err(DetailError::Server(error)),
            None => Ok(document),
        }
    }
}
