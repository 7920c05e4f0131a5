//! Accelerator detection.

use ednn_training::Device;
use std::path::Path;
use tracing::debug;

/// Whether a CUDA device is usable from this process.
///
/// `CUDA_VISIBLE_DEVICES` set to an empty string or `-1` hides every GPU.
pub fn cuda_available() -> bool {
    if let Ok(visible) = std::env::var("CUDA_VISIBLE_DEVICES") {
        let visible = visible.trim();
        if visible.is_empty() || visible == "-1" {
            return false;
        }
    }

    if Path::new("/proc/driver/nvidia/version").exists() {
        return true;
    }

    std::process::Command::new("nvidia-smi")
        .arg("-L")
        .output()
        .is_ok_and(|out| out.status.success())
}

/// Resolve `Auto` once per run; explicit choices pass through.
pub fn resolve_device(requested: Device) -> Device {
    let resolved = match requested {
        Device::Auto => {
            if cuda_available() {
                Device::Cuda
            } else {
                Device::Cpu
            }
        }
        explicit => explicit,
    };
    debug!(requested = %requested, resolved = %resolved, "resolved training device");
    resolved
}
