//! Test and helper mocks for ivmon_core.
//!
//! Every mock hands out a cloneable probe so a test can keep observing it
//! after the mock itself has been moved into an aggregator or a station.
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use ivmon_traits::{Adc, Level, OutputLine};

use crate::transmit::ReadingSink;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// One scripted ADC result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Read {
    Value(i32),
    NotReady,
    Fault(String),
}

#[derive(Debug, Clone, Default)]
pub struct AdcProbe {
    reads: Arc<AtomicUsize>,
    power_downs: Arc<AtomicUsize>,
}

impl AdcProbe {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    pub fn power_downs(&self) -> usize {
        self.power_downs.load(Ordering::Relaxed)
    }
}

/// Plays back a script of reads, then repeats `fallback` forever.
#[derive(Debug)]
pub struct ScriptedAdc {
    script: VecDeque<Read>,
    fallback: Read,
    probe: AdcProbe,
}

impl ScriptedAdc {
    pub fn new(script: impl IntoIterator<Item = Read>, fallback: Read) -> Self {
        Self {
            script: script.into_iter().collect(),
            fallback,
            probe: AdcProbe::default(),
        }
    }

    /// Every read returns `raw`.
    pub fn constant(raw: i32) -> Self {
        Self::new([], Read::Value(raw))
    }

    pub fn values(values: impl IntoIterator<Item = i32>, fallback: i32) -> Self {
        Self::new(values.into_iter().map(Read::Value), Read::Value(fallback))
    }

    pub fn probe(&self) -> AdcProbe {
        self.probe.clone()
    }
}

impl Adc for ScriptedAdc {
    fn read_raw(&mut self) -> Result<i32, BoxError> {
        self.probe.reads.fetch_add(1, Ordering::Relaxed);
        let next = self
            .script
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        match next {
            Read::Value(v) => Ok(v),
            Read::NotReady => Err(Box::new(std::io::Error::other("hx711 data-ready timeout"))),
            Read::Fault(msg) => Err(Box::new(std::io::Error::other(msg))),
        }
    }

    fn power_down(&mut self) -> Result<(), BoxError> {
        self.probe.power_downs.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Noise-free load cell: `raw = zero + load_g * counts_per_gram`.
#[derive(Debug, Clone)]
pub struct LoadHandle {
    load_g: Arc<Mutex<f64>>,
}

impl LoadHandle {
    pub fn set_load_g(&self, grams: f64) {
        if let Ok(mut g) = self.load_g.lock() {
            *g = grams;
        }
    }

    pub fn load_g(&self) -> f64 {
        self.load_g.lock().map(|g| *g).unwrap_or(0.0)
    }
}

#[derive(Debug)]
pub struct LoadCellAdc {
    zero: i32,
    counts_per_gram: f64,
    handle: LoadHandle,
    probe: AdcProbe,
}

impl LoadCellAdc {
    pub fn new(zero: i32, counts_per_gram: f64) -> Self {
        Self {
            zero,
            counts_per_gram,
            handle: LoadHandle {
                load_g: Arc::new(Mutex::new(0.0)),
            },
            probe: AdcProbe::default(),
        }
    }

    pub fn handle(&self) -> LoadHandle {
        self.handle.clone()
    }

    pub fn probe(&self) -> AdcProbe {
        self.probe.clone()
    }
}

impl Adc for LoadCellAdc {
    fn read_raw(&mut self) -> Result<i32, BoxError> {
        self.probe.reads.fetch_add(1, Ordering::Relaxed);
        let counts = (self.handle.load_g() * self.counts_per_gram).round() as i32;
        Ok(self.zero.saturating_add(counts))
    }

    fn power_down(&mut self) -> Result<(), BoxError> {
        self.probe.power_downs.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Output line that records every level written to it.
#[derive(Debug, Default)]
pub struct RecordingLine {
    history: Arc<Mutex<Vec<Level>>>,
}

#[derive(Debug, Clone)]
pub struct LineProbe {
    history: Arc<Mutex<Vec<Level>>>,
}

impl RecordingLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&self) -> LineProbe {
        LineProbe {
            history: self.history.clone(),
        }
    }
}

impl LineProbe {
    pub fn history(&self) -> Vec<Level> {
        self.history.lock().map(|h| h.clone()).unwrap_or_default()
    }

    /// Last written level; a line never written counts as low.
    pub fn level(&self) -> Level {
        self.history().last().copied().unwrap_or(Level::Low)
    }
}

impl OutputLine for RecordingLine {
    fn write(&mut self, level: Level) -> Result<(), BoxError> {
        self.history
            .lock()
            .map_err(|_| "line history poisoned")?
            .push(level);
        Ok(())
    }
}

/// Sink that records every weight it is given.
#[derive(Debug, Clone)]
pub struct RecordingSink {
    sent: Arc<Mutex<Vec<f64>>>,
    ack: bool,
}

impl RecordingSink {
    pub fn new(ack: bool) -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            ack,
        }
    }

    pub fn sent(&self) -> Vec<f64> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl ReadingSink for RecordingSink {
    fn send(&mut self, weight_g: f64) -> bool {
        if let Ok(mut s) = self.sent.lock() {
            s.push(weight_g);
        }
        self.ack
    }
}
