use serde::{Deserialize, Serialize};

use crate::core::DocValuesError;
use crate::packed::{self, COMPACT, FASTEST};

/// Write-side tuning knobs. Nothing here is needed to read a segment back:
/// every choice that affects decoding is recorded in the files themselves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CodecConfig {
    /// How much wider than strictly necessary a packed array may get in
    /// exchange for faster decoding, as a fraction of the required width.
    #[serde(default = "CodecConfig::default_acceptable_overhead_ratio")]
    pub acceptable_overhead_ratio: f32,
    /// Values per block for block-packed numeric and address streams.
    #[serde(default = "CodecConfig::default_block_size")]
    pub block_size: u32,
}

impl CodecConfig {
    fn default_acceptable_overhead_ratio() -> f32 {
        packed::DEFAULT
    }

    fn default_block_size() -> u32 {
        4096
    }

    /// Settings for length-normalization factors: byte-wide values are stored
    /// uncompressed whenever the table would resolve to 8 bits anyway.
    pub fn norms() -> Self {
        Self {
            acceptable_overhead_ratio: FASTEST,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), DocValuesError> {
        packed::check_block_size(self.block_size)
            .map_err(|e| DocValuesError::ConfigParsingError(e.to_string()))?;
        if !(COMPACT..=FASTEST).contains(&self.acceptable_overhead_ratio) {
            return Err(DocValuesError::ConfigParsingError(format!(
                "acceptable_overhead_ratio must be within [{COMPACT}, {FASTEST}], got {}",
                self.acceptable_overhead_ratio
            )));
        }
        Ok(())
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            acceptable_overhead_ratio: Self::default_acceptable_overhead_ratio(),
            block_size: Self::default_block_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_default() {
        let codec = CodecConfig::default();
        assert_eq!(codec.acceptable_overhead_ratio, 0.25);
        assert_eq!(codec.block_size, 4096);
        assert!(codec.validate().is_ok());
    }

    #[test]
    fn test_norms_preset() {
        let codec = CodecConfig::norms();
        assert_eq!(codec.acceptable_overhead_ratio, 7.0);
        assert_eq!(codec.block_size, 4096);
    }

    #[test]
    fn test_validate_ratio_out_of_range() {
        let codec = CodecConfig {
            acceptable_overhead_ratio: 9.0,
            ..CodecConfig::default()
        };
        assert!(codec.validate().is_err());
    }
}
