//! Shared helpers for integration tests

#![allow(dead_code)]

use clusterdash_core::brightness::BrightnessController;
use clusterdash_core::dashboard::DashboardCore;
use clusterdash_core::protocol::MemoryChannel;
use clusterdash_core::store::PersistentStore;
use std::path::PathBuf;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

/// Route library logs to the test output; `RUST_LOG=debug` to see them
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A core connected to an in-memory controller, with its data file in a temp dir
pub struct Harness {
    pub dir: TempDir,
    pub channel: MemoryChannel,
    pub core: DashboardCore,
}

impl Harness {
    pub fn connected() -> Self {
        init_tracing();
        let dir = TempDir::new().unwrap();
        let store = PersistentStore::load(dir.path().join("persistent_data.json"));
        let mut core = DashboardCore::new(store, BrightnessController::new(Vec::new()));
        let channel = MemoryChannel::new();
        core.attach_channel(Box::new(channel.clone()));
        // Drop the startup handshake so tests only see what they provoke
        channel.take_written();
        Self { dir, channel, core }
    }

    pub fn data_path(&self) -> PathBuf {
        self.dir.path().join("persistent_data.json")
    }

    /// Feed one line and run the tick that decodes it
    pub fn line(&mut self, line: &str, now_ms: u64) {
        self.channel.feed_str(line);
        self.channel.feed_str("\n");
        self.core.tick(now_ms);
    }

    pub fn save_count(&self) -> u64 {
        self.core.store().record().save_count
    }
}
