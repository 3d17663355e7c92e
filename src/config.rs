//! Construction-time settings shared by [crate::BitReader] and [crate::BitWriter].

use crate::{limiter::INITIAL_ARRAY_CAPACITY, order::BitOrder};

/// Stream settings. With the `serde` feature this can be loaded from a config file:
///
/// ```json
/// { "bit_order": "Msb0", "initial_array_capacity": 64 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StreamConfig {
    /// Bit order the stream is bound to.
    pub bit_order: BitOrder,
    /// Starting capacity of the buffer used by until-end array reads. Ignored by writers.
    pub initial_array_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            bit_order: BitOrder::default(),
            initial_array_capacity: INITIAL_ARRAY_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = StreamConfig::default();
        assert_eq!(config.bit_order, BitOrder::Lsb0);
        assert_eq!(config.initial_array_capacity, 32);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json() {
        let config: StreamConfig = serde_json::from_str(r#"{ "bit_order": "Msb0" }"#).unwrap();
        assert_eq!(config.bit_order, BitOrder::Msb0);
        assert_eq!(config.initial_array_capacity, 32);

        let config: StreamConfig =
            serde_json::from_str(r#"{ "bit_order": "Msb0Direct", "initial_array_capacity": 4 }"#)
                .unwrap();
        assert_eq!(config.bit_order, BitOrder::Msb0Direct);
        assert_eq!(config.initial_array_capacity, 4);
    }
}
