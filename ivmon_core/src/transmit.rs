//! Forwarding readings to the remote collector.
//!
//! Transmission never fails the monitoring loop: every error is logged and
//! reported as `false`.
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

/// Destination for smoothed readings.
pub trait ReadingSink {
    /// Send one reading; `true` when the collector acknowledged it.
    fn send(&mut self, weight_g: f64) -> bool;

    /// `false` when readings are deliberately kept local.
    fn is_enabled(&self) -> bool {
        true
    }
}

impl<S: ReadingSink + ?Sized> ReadingSink for Box<S> {
    fn send(&mut self, weight_g: f64) -> bool {
        (**self).send(weight_g)
    }

    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }
}

/// Used when no collector is configured. Never called by the monitor.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ReadingSink for NullSink {
    fn send(&mut self, _weight_g: f64) -> bool {
        false
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Integer grams on the wire: negatives clamp to 0, the rest round half away
/// from zero. NaN maps to 0.
pub fn wire_weight(weight_g: f64) -> u64 {
    if weight_g > 0.0 {
        weight_g.round() as u64
    } else {
        0
    }
}

#[derive(Debug, Serialize)]
struct Reading {
    weight: u64,
}

pub struct TransmissionClient {
    client: reqwest::blocking::Client,
    url: String,
}

impl TransmissionClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST `{"weight": weight}` once and hand back the raw outcome.
    pub fn post(&self, weight: u64) -> Result<reqwest::blocking::Response, reqwest::Error> {
        self.client
            .post(&self.url)
            .json(&Reading { weight })
            .send()
    }

    /// Post `{"weight": 0}` and report whether the collector answered 200.
    pub fn test_connection(&self) -> bool {
        match self.post(0) {
            Ok(resp) => resp.status() == reqwest::StatusCode::OK,
            Err(e) => {
                debug!(error = %e, url = %self.url, "collector unreachable");
                false
            }
        }
    }
}

impl ReadingSink for TransmissionClient {
    fn send(&mut self, weight_g: f64) -> bool {
        let weight = wire_weight(weight_g);
        let resp = match self.post(weight) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, url = %self.url, "connection error");
                return false;
            }
        };

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            let body = resp.text().unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "collector rejected reading");
            return false;
        }

        match resp.json::<serde_json::Value>() {
            Ok(result) => {
                info!(weight, response = %result, "sent reading");
                true
            }
            Err(e) => {
                warn!(error = %e, "collector response is not JSON");
                false
            }
        }
    }
}
