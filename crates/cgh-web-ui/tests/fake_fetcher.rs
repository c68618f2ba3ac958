//! In-memory fetcher for web UI tests.

#![allow(dead_code)]

use async_trait::async_trait;
use cgh_common::{ConnectionDescriptor, MonitorResult, ReadingSnapshot, ReadingValue};
use cgh_poller::DataFetcher;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Fetcher returning a switchable result.
pub struct FakeFetcher {
    result: Mutex<MonitorResult<ReadingSnapshot>>,
    calls: AtomicUsize,
}

impl FakeFetcher {
    /// Fetcher that succeeds with [`plant_readings`].
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(Ok(plant_readings())),
            calls: AtomicUsize::new(0),
        })
    }

    /// Result returned by subsequent fetches.
    pub fn set_result(&self, result: MonitorResult<ReadingSnapshot>) {
        *self.result.lock().unwrap() = result;
    }

    /// Number of fetches so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataFetcher for FakeFetcher {
    async fn fetch(&self, _: &ConnectionDescriptor) -> MonitorResult<ReadingSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.lock().unwrap().clone()
    }
}

/// Readings with one warm bearing and one low oil pressure.
pub fn plant_readings() -> ReadingSnapshot {
    let mut snapshot = ReadingSnapshot::default();
    for (name, value) in [
        ("Gerador_FaseAB", 6612.437),
        ("Turbina_PosicaoDistribuidor", 71.25),
        ("UHLM_PressaoOleo", 128.0),
        ("UHRV_PressaoOleo", 92.0),
        ("UHLM_VazaoOleo", 12.6),
        ("MED_750450_AR1_RTD1", 70.0),
        ("MED_750450_AR1_RTD2", 48.3),
    ] {
        snapshot
            .real
            .insert(name.to_string(), ReadingValue::Number(value));
    }
    snapshot
        .int
        .insert("Turbina_Velocidade".into(), ReadingValue::Number(514.0));
    snapshot
}
