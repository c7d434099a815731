//! Host hardware collaborators
//!
//! The benchmark engine only sees the [`FrequencySource`] and [`HostInfo`]
//! traits; [`SysinfoProbe`] backs both with the `sysinfo` crate.

use std::sync::Mutex;

use sysinfo::System;
use tracing::debug;

/// Supplies instantaneous processor clock readings
pub trait FrequencySource: Send + Sync {
    /// Current processor frequency in MHz, or `None` when unavailable
    fn current_frequency_mhz(&self) -> Option<f64>;
}

/// Supplies the identity and size of the host processor
pub trait HostInfo: Send + Sync {
    /// Human-readable processor model, or `None` when unavailable
    fn processor_label(&self) -> Option<String>;

    /// Number of logical processors; may be 0 if detection failed
    fn logical_processors(&self) -> usize;
}

/// `sysinfo`-backed implementation of both collaborators
pub struct SysinfoProbe {
    system: Mutex<System>,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_all();
        Self {
            system: Mutex::new(system),
        }
    }

    fn with_system<T>(&self, f: impl FnOnce(&mut System) -> T) -> T {
        let mut guard = self.system.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl FrequencySource for SysinfoProbe {
    /// Mean current frequency over every logical CPU reporting one
    fn current_frequency_mhz(&self) -> Option<f64> {
        self.with_system(|system| {
            system.refresh_cpu_frequency();
            let readings: Vec<f64> = system
                .cpus()
                .iter()
                .map(|cpu| cpu.frequency())
                .filter(|&mhz| mhz > 0)
                .map(|mhz| mhz as f64)
                .collect();

            if readings.is_empty() {
                debug!("no CPU frequency reading available");
                None
            } else {
                Some(readings.iter().sum::<f64>() / readings.len() as f64)
            }
        })
    }
}

impl HostInfo for SysinfoProbe {
    fn processor_label(&self) -> Option<String> {
        self.with_system(|system| {
            system
                .cpus()
                .first()
                .map(|cpu| cpu.brand().trim().to_string())
                .filter(|brand| !brand.is_empty())
        })
    }

    fn logical_processors(&self) -> usize {
        self.with_system(|system| system.cpus().len())
    }
}
