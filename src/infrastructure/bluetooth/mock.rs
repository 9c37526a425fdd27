//! Scripted BLE connector for tests.
//!
//! [`MockConnector`] hands out [`MockLink`]s that share one recorder. Tests
//! script connect failures, failing writes and per-write latency, then read
//! back the exact sequence of events the session produced.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::infrastructure::bluetooth::transport::{BleConnector, GattLink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    Connect(String),
    WriteStarted(usize),
    WriteFinished(usize),
    Disconnect,
}

#[derive(Debug, Default)]
struct Recorder {
    connect_failures: u32,
    connect_hang: Option<Duration>,
    connect_calls: u32,
    link_alive: bool,
    write_count: usize,
    fail_writes: Vec<usize>,
    write_delays: HashMap<usize, Duration>,
    writes: Vec<(String, Vec<u8>, bool)>,
    events: Vec<MockEvent>,
}

#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    recorder: Arc<Mutex<Recorder>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` connect calls.
    pub fn fail_connects(&self, n: u32) {
        self.recorder.lock().unwrap().connect_failures = n;
    }

    /// Make every connect call sleep before answering.
    pub fn hang_connects(&self, delay: Duration) {
        self.recorder.lock().unwrap().connect_hang = Some(delay);
    }

    /// Fail the write with this global (0-based) write number.
    pub fn fail_write(&self, write_number: usize) {
        self.recorder.lock().unwrap().fail_writes.push(write_number);
    }

    /// Delay the write with this global write number.
    pub fn delay_write(&self, write_number: usize, delay: Duration) {
        self.recorder
            .lock()
            .unwrap()
            .write_delays
            .insert(write_number, delay);
    }

    /// Simulate the stack noticing the link went away.
    pub fn drop_link(&self) {
        self.recorder.lock().unwrap().link_alive = false;
    }

    pub fn connect_calls(&self) -> u32 {
        self.recorder.lock().unwrap().connect_calls
    }

    /// Frames written, in order.
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.recorder
            .lock()
            .unwrap()
            .writes
            .iter()
            .map(|(_, data, _)| data.clone())
            .collect()
    }

    /// Characteristic and response flag of every write.
    pub fn write_targets(&self) -> Vec<(String, bool)> {
        self.recorder
            .lock()
            .unwrap()
            .writes
            .iter()
            .map(|(uuid, _, with_response)| (uuid.clone(), *with_response))
            .collect()
    }

    pub fn events(&self) -> Vec<MockEvent> {
        self.recorder.lock().unwrap().events.clone()
    }
}

#[async_trait]
impl BleConnector for MockConnector {
    type Link = MockLink;

    async fn connect(&self, address: &str) -> Result<MockLink> {
        let hang = {
            let mut recorder = self.recorder.lock().unwrap();
            recorder.connect_calls += 1;
            recorder.connect_hang
        };
        if let Some(delay) = hang {
            tokio::time::sleep(delay).await;
        }

        let mut recorder = self.recorder.lock().unwrap();
        if recorder.connect_failures > 0 {
            recorder.connect_failures -= 1;
            return Err(Error::Transport("device unreachable".into()));
        }
        recorder.link_alive = true;
        recorder.events.push(MockEvent::Connect(address.to_string()));
        Ok(MockLink {
            recorder: Arc::clone(&self.recorder),
        })
    }
}

#[derive(Debug)]
pub struct MockLink {
    recorder: Arc<Mutex<Recorder>>,
}

#[async_trait]
impl GattLink for MockLink {
    async fn write(
        &mut self,
        characteristic: &str,
        data: &[u8],
        with_response: bool,
    ) -> Result<()> {
        let (number, delay) = {
            let mut recorder = self.recorder.lock().unwrap();
            if !recorder.link_alive {
                return Err(Error::Transport("not connected".into()));
            }
            let number = recorder.write_count;
            recorder.write_count += 1;
            recorder.events.push(MockEvent::WriteStarted(number));
            (number, recorder.write_delays.get(&number).copied())
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut recorder = self.recorder.lock().unwrap();
        if recorder.fail_writes.contains(&number) {
            return Err(Error::Transport("write rejected".into()));
        }
        recorder
            .writes
            .push((characteristic.to_string(), data.to_vec(), with_response));
        recorder.events.push(MockEvent::WriteFinished(number));
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        let mut recorder = self.recorder.lock().unwrap();
        recorder.link_alive = false;
        recorder.events.push(MockEvent::Disconnect);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.recorder.lock().unwrap().link_alive
    }
}
