use log::warn;
use serde::{Deserialize, Serialize};

/// Where a network keeps its parameters and runs its arithmetic.
///
/// Resolved exactly once, when the network is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    #[default]
    Cpu,
    AcceleratorIfAvailable,
}

impl Device {
    /// Resolve the requested placement to the device actually used.
    ///
    /// This build ships only the ndarray CPU backend, so an accelerator
    /// request falls back to `Cpu` with a warning.
    pub fn resolve(self) -> Device {
        match self {
            Device::Cpu => Device::Cpu,
            Device::AcceleratorIfAvailable => {
                warn!("no accelerator backend is available, placing network on cpu");
                Device::Cpu
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accelerator_request_resolves_to_cpu() {
        assert_eq!(Device::AcceleratorIfAvailable.resolve(), Device::Cpu);
        assert_eq!(Device::Cpu.resolve(), Device::Cpu);
    }

    #[test]
    fn test_device_serde_names() {
        let device: Device = serde_json::from_str("\"accelerator_if_available\"").unwrap();
        assert_eq!(device, Device::AcceleratorIfAvailable);
    }
}
