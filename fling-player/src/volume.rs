//! Output volume capability
//!
//! The session exposes volume as a fraction in `[0.0, 1.0]` and maps it onto
//! the integer steps of the underlying control.

use crate::error::Result;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Stepped output volume with a mute switch
pub trait VolumeControl: Send + Sync {
    /// Highest step supported by the control
    fn max_level(&self) -> u32;

    fn level(&self) -> Result<u32>;

    fn set_level(&self, level: u32) -> Result<()>;

    fn set_muted(&self, muted: bool) -> Result<()>;
}

/// In-process volume state
#[derive(Debug)]
pub struct SoftwareVolume {
    max: u32,
    level: AtomicU32,
    muted: AtomicBool,
}

impl SoftwareVolume {
    /// New control at full volume
    pub fn new(max: u32) -> Self {
        Self {
            max,
            level: AtomicU32::new(max),
            muted: AtomicBool::new(false),
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }
}

impl VolumeControl for SoftwareVolume {
    fn max_level(&self) -> u32 {
        self.max
    }

    fn level(&self) -> Result<u32> {
        Ok(self.level.load(Ordering::Relaxed))
    }

    fn set_level(&self, level: u32) -> Result<()> {
        self.level.store(level.min(self.max), Ordering::Relaxed);
        Ok(())
    }

    fn set_muted(&self, muted: bool) -> Result<()> {
        self.muted.store(muted, Ordering::Relaxed);
        Ok(())
    }
}

/// Fraction of `max` represented by `level`, 0.0 for a control without steps
pub fn level_to_fraction(level: u32, max: u32) -> f64 {
    if max == 0 {
        0.0
    } else {
        f64::from(level) / f64::from(max)
    }
}

/// Step for a fraction, rounded down
pub fn fraction_to_level(fraction: f64, max: u32) -> u32 {
    (fraction * f64::from(max)).floor() as u32
}
