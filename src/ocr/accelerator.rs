//! One-time hardware accelerator probe.

use std::process::{Command, Stdio};

/// Whether a GPU accelerator is present for OCR.
///
/// Decided once at startup and passed to the components that care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accelerator {
    /// An accelerator answered the probe
    Available,
    /// No accelerator, or probing was disabled
    #[default]
    Unavailable,
}

impl Accelerator {
    /// Probe for an accelerator. Returns `Unavailable` without probing when
    /// `enabled` is false.
    pub fn probe(enabled: bool) -> Self {
        if !enabled {
            log::info!("Accelerator disabled; running OCR on CPU");
            return Accelerator::Unavailable;
        }

        let found = Command::new("nvidia-smi")
            .arg("-L")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map(|out| out.status.success() && out.stdout.iter().any(|b| !b.is_ascii_whitespace()))
            .unwrap_or(false);

        if found {
            log::info!("GPU accelerator available");
            Accelerator::Available
        } else {
            log::info!("No GPU accelerator found; running OCR on CPU");
            Accelerator::Unavailable
        }
    }

    /// Whether the accelerator is available.
    pub fn is_available(self) -> bool {
        self == Accelerator::Available
    }

    /// Default worker count for this accelerator state.
    ///
    /// A single accelerator is shared, so one worker feeds it; on CPU the
    /// pool matches the core count.
    pub fn default_workers(self) -> usize {
        match self {
            Accelerator::Available => 1,
            Accelerator::Unavailable => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

impl std::fmt::Display for Accelerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Accelerator::Available => f.write_str("gpu"),
            Accelerator::Unavailable => f.write_str("cpu"),
        }
    }
}
