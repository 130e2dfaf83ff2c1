//! Mapping between receiver volume and host percentages.
//!
//! Receivers report volume in tenths of a dB. The host shows a 0-100
//! percentage over the configured `[min, max]` dB window.

/// The dB window mapped onto 0-100 %
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeRange {
    pub min: f64,
    pub max: f64,
}

impl Default for VolumeRange {
    fn default() -> Self {
        Self {
            min: -65.0,
            max: -10.0,
        }
    }
}

impl VolumeRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn gap(&self) -> f64 {
        self.max - self.min
    }

    /// Percentage for a device volume in tenths of a dB, clamped to 0..=100
    pub fn to_percent(&self, tenths: i32) -> u8 {
        let db = f64::from(tenths) / 10.0;
        let percent = round_half_up(100.0 * (db - self.min) / self.gap());
        percent.clamp(0.0, 100.0) as u8
    }

    /// Device volume in tenths of a dB for a percentage, on whole dB steps
    pub fn to_device(&self, percent: u8) -> i32 {
        let db = round_half_up(f64::from(percent.min(100)) / 100.0 * self.gap() + self.min);
        db as i32 * 10
    }
}

/// Device volume in tenths of a dB for a configured dB value such as `play_volume`
pub fn db_to_tenths(db: f64) -> i32 {
    round_half_up(db * 10.0) as i32
}

// Halves round toward positive infinity, so -29.5 dB becomes -29 dB.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}
