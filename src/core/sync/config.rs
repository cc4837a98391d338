/*!
 * Synchronization Configuration
 *
 * Construction-time configuration for the striped map
 */

use crate::core::errors::{ConfigError, ConfigResult};
use crate::core::limits::{DEFAULT_MAP_STRIPES, HIGH_CONTENTION_MAP_STRIPES, MAX_MAP_STRIPES};

/// Striping configuration for `ConcurrentMap`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapConfig {
    /// Number of independently locked stripes (power of two)
    pub stripes: usize,
    /// Initial capacity reserved in each stripe
    pub stripe_capacity: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            stripes: DEFAULT_MAP_STRIPES,
            stripe_capacity: 0,
        }
    }
}

impl MapConfig {
    /// Configuration for maps written by many threads at once
    pub const fn high_contention() -> Self {
        Self {
            stripes: HIGH_CONTENTION_MAP_STRIPES,
            stripe_capacity: 0,
        }
    }

    /// Configuration with a specific stripe count
    pub const fn with_stripes(stripes: usize) -> Self {
        Self {
            stripes,
            stripe_capacity: 0,
        }
    }

    /// Spread an expected entry count across the stripes up front
    #[must_use]
    pub const fn with_expected_entries(mut self, entries: usize) -> Self {
        self.stripe_capacity = if self.stripes == 0 {
            0
        } else {
            entries.div_ceil(self.stripes)
        };
        self
    }

    /// Check the stripe count is usable
    pub fn validate(&self) -> ConfigResult<()> {
        if self.stripes == 0 || !self.stripes.is_power_of_two() || self.stripes > MAX_MAP_STRIPES {
            return Err(ConfigError::InvalidStripes(self.stripes));
        }
        Ok(())
    }
}
