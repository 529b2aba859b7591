//! Device location for place-aware replies
//!
//! Locating is split in two seams: a [`PositionSource`] that produces raw
//! coordinates, and an optional [`ReverseGeocoder`] that turns them into a
//! street address. [`LocationService`] combines both and keeps the user's
//! saved location on the backend in sync.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api::{Location, UserApi};
use crate::config::LocationConfig;
use crate::error::{ChataiError, Result};
use crate::notify::Notifier;

const LOCATION_UNAVAILABLE: &str = "Unable to get your location. Please enable location services.";

/// Outcome of a position request
#[derive(Debug, Clone, PartialEq)]
pub enum PositionFix {
    /// Coordinates were obtained
    Located(Location),
    /// The source refused or has no position
    Unavailable(String),
    /// No answer within the configured timeout
    TimedOut,
}

/// Produces the device's coordinates
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self) -> PositionFix;
}

/// Always reports the same coordinates
#[derive(Debug, Clone)]
pub struct FixedPositionSource {
    location: Location,
}

impl FixedPositionSource {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            location: Location::new(latitude, longitude),
        }
    }
}

#[async_trait]
impl PositionSource for FixedPositionSource {
    async fn current_position(&self) -> PositionFix {
        PositionFix::Located(self.location.clone())
    }
}

/// A source with no position, e.g. when coordinates were not supplied
#[derive(Debug, Clone)]
pub struct UnavailablePositionSource {
    reason: String,
}

impl UnavailablePositionSource {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl PositionSource for UnavailablePositionSource {
    async fn current_position(&self) -> PositionFix {
        PositionFix::Unavailable(self.reason.clone())
    }
}

/// Turns coordinates into a human-readable address
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted: String,
}

/// OpenCage-compatible reverse geocoder
#[derive(Debug, Clone)]
pub struct OpenCageGeocoder {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenCageGeocoder {
    /// Build a geocoder, or `None` when no API key is configured
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn from_config(config: &LocationConfig) -> Result<Option<Self>> {
        let Some(api_key) = config.geocoder_api_key.clone().filter(|k| !k.is_empty()) else {
            tracing::debug!("No geocoder API key configured, reverse geocoding disabled");
            return Ok(None);
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ChataiError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Some(Self {
            client,
            base_url: config.geocoder_url.trim_end_matches('/').to_string(),
            api_key,
        }))
    }
}

#[async_trait]
impl ReverseGeocoder for OpenCageGeocoder {
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<String> {
        let url = format!("{}/geocode/v1/json", self.base_url);
        let query = format!("{},{}", latitude, longitude);

        let response = self
            .client
            .get(&url)
            .query(&[("q", query.as_str()), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| ChataiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ChataiError::Geolocation(format!(
                "Geocoder returned {}",
                response.status()
            ))
            .into());
        }

        let body: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| ChataiError::Geolocation(format!("Malformed geocoder response: {}", e)))?;

        body.results
            .into_iter()
            .next()
            .map(|r| r.formatted)
            .ok_or_else(|| ChataiError::Geolocation("No address for position".to_string()).into())
    }
}

/// Current location state and its persistence
pub struct LocationService {
    api: Arc<dyn UserApi>,
    source: Arc<dyn PositionSource>,
    geocoder: Option<Arc<dyn ReverseGeocoder>>,
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
    current: Mutex<Option<Location>>,
}

impl LocationService {
    pub fn new(
        api: Arc<dyn UserApi>,
        source: Arc<dyn PositionSource>,
        notifier: Arc<dyn Notifier>,
        config: &LocationConfig,
    ) -> Self {
        Self {
            api,
            source,
            geocoder: None,
            notifier,
            timeout: Duration::from_secs(config.timeout_seconds),
            current: Mutex::new(None),
        }
    }

    /// Resolve addresses with `geocoder`
    pub fn with_geocoder(mut self, geocoder: Arc<dyn ReverseGeocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    /// Override the position timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The enabled location, if any
    pub fn current(&self) -> Option<Location> {
        self.current.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn set_current(&self, location: Option<Location>) {
        if let Ok(mut slot) = self.current.lock() {
            *slot = location;
        }
    }

    /// Ask the source for a position, bounded by the timeout
    pub async fn locate(&self) -> PositionFix {
        match tokio::time::timeout(self.timeout, self.source.current_position()).await {
            Ok(fix) => fix,
            Err(_) => {
                tracing::warn!("Position request timed out after {:?}", self.timeout);
                PositionFix::TimedOut
            }
        }
    }

    /// Locate the device, resolve its address, and save it to the profile
    ///
    /// Returns the enabled location. A failed save still enables the
    /// location locally.
    pub async fn request_location(&self) -> Result<Location> {
        let mut location = match self.locate().await {
            PositionFix::Located(location) => location,
            PositionFix::Unavailable(reason) => {
                tracing::warn!("Position unavailable: {}", reason);
                self.notifier.error(LOCATION_UNAVAILABLE);
                return Err(ChataiError::Geolocation(reason).into());
            }
            PositionFix::TimedOut => {
                self.notifier.error(LOCATION_UNAVAILABLE);
                let reason = "Position request timed out".to_string();
                return Err(ChataiError::Geolocation(reason).into());
            }
        };

        if let Some(geocoder) = &self.geocoder {
            match geocoder.reverse(location.latitude, location.longitude).await {
                Ok(address) => location.address = Some(address),
                Err(e) => tracing::warn!("Reverse geocoding failed: {}", e),
            }
        }

        self.set_current(Some(location.clone()));

        match self.api.save_location(&location).await {
            Ok(()) => {
                let notice = "Location saved and enabled successfully!";
                self.notifier.success(notice);
            }
            Err(e) => {
                tracing::error!("Error saving location: {}", e);
                let notice = "Location enabled (but not saved to profile)";
                self.notifier.info(notice);
            }
        }

        Ok(location)
    }

    /// Load the location saved on the profile
    ///
    /// A missing location is `Ok(None)`; other failures are logged and
    /// leave the current state untouched.
    pub async fn load_user_location(&self) -> Result<Option<Location>> {
        match self.api.get_location().await {
            Ok(location) => {
                if location.is_some() {
                    self.set_current(location.clone());
                }
                Ok(location)
            }
            Err(e) if crate::error::is_not_found(&e) => Ok(None),
            Err(e) => {
                tracing::error!("Error loading user location: {}", e);
                Err(e)
            }
        }
    }

    /// Remove the saved location and disable it locally
    pub async fn clear_location(&self) -> Result<()> {
        if let Err(e) = self.api.delete_location().await {
            tracing::error!("Error clearing location: {}", e);
            self.notifier.error("Failed to clear location data");
            return Err(e);
        }
        self.set_current(None);
        self.notifier.success("Location data cleared");
        Ok(())
    }
}
