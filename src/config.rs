//! Feeder configuration
//!
//! Construction parameters for the feeder: where the feed lives, how to
//! authenticate, and the tuning knobs for the poll loops. Configuration is
//! immutable once built; the feeder clones what it needs at start.

use crate::error::{Error, Result};
use crate::types::StringMap;
use std::time::Duration;

/// Tuning options for the feed loops
///
/// Field names match the options recognized by the feeder:
/// sleeps between pages, the idle wait with its adaptive floor, queue
/// capacity, and the priority/adaptive toggles.
#[derive(Debug, Clone)]
pub struct FeedTuning {
    /// Backward loop delay between non-empty pages
    pub down_requests_sleep: Duration,
    /// Forward loop delay between non-empty pages
    pub up_requests_sleep: Duration,
    /// Forward loop delay when caught up (no new items)
    pub up_wait_sleep: Duration,
    /// Floor for the idle delay in adaptive mode
    pub up_wait_sleep_min: Duration,
    /// Bounded queue capacity
    pub queue_size: usize,
    /// Enable the additive increase/decrease idle-delay controller
    pub adaptive: bool,
    /// Dequeue forward-sourced items before backward-sourced ones
    pub with_priority: bool,
    /// Watchdog check interval
    pub watchdog_interval: Duration,
    /// Forward heartbeat age that counts as a stall
    pub stall_threshold: Duration,
    /// Bounded wait when the consumer drains a momentarily empty queue
    pub drain_wait: Duration,
}

impl Default for FeedTuning {
    fn default() -> Self {
        Self {
            down_requests_sleep: Duration::from_secs(5),
            up_requests_sleep: Duration::from_secs(1),
            up_wait_sleep: Duration::from_secs(30),
            up_wait_sleep_min: Duration::from_secs(5),
            queue_size: 101,
            adaptive: false,
            with_priority: false,
            watchdog_interval: Duration::from_secs(300),
            stall_threshold: Duration::from_secs(15 * 60 * 60),
            drain_wait: Duration::from_millis(250),
        }
    }
}

/// Configuration for a feeder session
#[derive(Debug, Clone)]
pub struct FeederConfig {
    /// Base URL of the API, e.g. `https://api.example.com`
    pub base_url: String,
    /// Protocol version segment, e.g. `v2`
    pub version: String,
    /// Access key sent on every request
    pub access_key: String,
    /// Resource name whose feed is consumed, e.g. `documents`
    pub resource: String,
    /// Extra filter parameters merged into every fetch
    pub extra_filters: StringMap,
    /// Request timeout for a single fetch
    pub request_timeout: Duration,
    /// Loop tuning
    pub tuning: FeedTuning,
}

impl FeederConfig {
    /// Create a new config builder
    pub fn builder() -> FeederConfigBuilder {
        FeederConfigBuilder::default()
    }

    /// Path of the feed endpoint relative to the base URL
    pub fn feed_path(&self) -> String {
        format!("/{}/{}/feed", self.version, self.resource)
    }
}

/// Builder for `FeederConfig`
#[derive(Debug, Default)]
pub struct FeederConfigBuilder {
    base_url: Option<String>,
    version: Option<String>,
    access_key: Option<String>,
    resource: Option<String>,
    extra_filters: StringMap,
    request_timeout: Option<Duration>,
    tuning: Option<FeedTuning>,
}

impl FeederConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the protocol version segment
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the access key
    pub fn access_key(mut self, key: impl Into<String>) -> Self {
        self.access_key = Some(key.into());
        self
    }

    /// Set the resource name
    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Add an extra filter parameter
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_filters.insert(key.into(), value.into());
        self
    }

    /// Set the per-request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the loop tuning
    pub fn tuning(mut self, tuning: FeedTuning) -> Self {
        self.tuning = Some(tuning);
        self
    }

    /// Build the config
    pub fn build(self) -> Result<FeederConfig> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::config("base_url is required"))?;
        let resource = self
            .resource
            .ok_or_else(|| Error::config("resource is required"))?;

        let mut tuning = self.tuning.unwrap_or_default();
        // The adaptive floor must not exceed the initial idle delay.
        if tuning.up_wait_sleep_min > tuning.up_wait_sleep {
            tuning.up_wait_sleep_min = tuning.up_wait_sleep;
        }
        if tuning.queue_size == 0 {
            return Err(Error::config("queue_size must be at least 1"));
        }

        Ok(FeederConfig {
            base_url,
            version: self.version.unwrap_or_else(|| "v2".to_string()),
            access_key: self.access_key.unwrap_or_default(),
            resource,
            extra_filters: self.extra_filters,
            request_timeout: self.request_timeout.unwrap_or(Duration::from_secs(30)),
            tuning,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuning_defaults() {
        let tuning = FeedTuning::default();
        assert_eq!(tuning.down_requests_sleep, Duration::from_secs(5));
        assert_eq!(tuning.up_requests_sleep, Duration::from_secs(1));
        assert_eq!(tuning.up_wait_sleep, Duration::from_secs(30));
        assert_eq!(tuning.up_wait_sleep_min, Duration::from_secs(5));
        assert_eq!(tuning.queue_size, 101);
        assert!(!tuning.adaptive);
        assert!(!tuning.with_priority);
        assert_eq!(tuning.stall_threshold, Duration::from_secs(54000));
    }

    #[test]
    fn test_builder() {
        let config = FeederConfig::builder()
            .base_url("https://api.example.com")
            .version("v3")
            .access_key("key-123")
            .resource("documents")
            .filter("team", "ops")
            .build()
            .unwrap();

        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.version, "v3");
        assert_eq!(config.access_key, "key-123");
        assert_eq!(config.feed_path(), "/v3/documents/feed");
        assert_eq!(config.extra_filters.get("team"), Some(&"ops".to_string()));
    }

    #[test]
    fn test_builder_requires_base_url_and_resource() {
        assert!(FeederConfig::builder().resource("docs").build().is_err());
        assert!(FeederConfig::builder()
            .base_url("https://api.example.com")
            .build()
            .is_err());
    }

    #[test]
    fn test_builder_clamps_idle_floor() {
        let tuning = FeedTuning {
            up_wait_sleep: Duration::from_secs(3),
            up_wait_sleep_min: Duration::from_secs(10),
            ..FeedTuning::default()
        };
        let config = FeederConfig::builder()
            .base_url("https://api.example.com")
            .resource("docs")
            .tuning(tuning)
            .build()
            .unwrap();
        assert_eq!(config.tuning.up_wait_sleep_min, Duration::from_secs(3));
    }

    #[test]
    fn test_builder_rejects_zero_queue() {
        let tuning = FeedTuning {
            queue_size: 0,
            ..FeedTuning::default()
        };
        let result = FeederConfig::builder()
            .base_url("https://api.example.com")
            .resource("docs")
            .tuning(tuning)
            .build();
        assert!(result.is_err());
    }
}
