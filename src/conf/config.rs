use std::path::Path;

use config::Config as CConfig;
use serde::{Deserialize, Serialize};

use crate::conf::CodecConfig;
use crate::core::DocValuesError::{self, ConfigParsingError};

const ENV_PREFIX: &str = "DOCVALUES";

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub codec: CodecConfig,
}

impl Config {
    pub fn from_str(toml_str: &str) -> Result<Config, DocValuesError> {
        let config = CConfig::builder()
            .add_source(config::File::from_str(toml_str, config::FileFormat::Toml))
            .build()
            .map_err(|e| ConfigParsingError(e.to_string()))?
            .try_deserialize::<Config>()
            .map_err(|e| ConfigParsingError(e.to_string()))?;
        config.codec.validate()?;
        Ok(config)
    }

    /// Load a TOML file, letting `DOCVALUES__CODEC__*` variables override it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Config, DocValuesError> {
        let config = CConfig::builder()
            .add_source(config::File::from(path.as_ref()).format(config::FileFormat::Toml))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Config>()?;
        config.codec.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_correct_toml() {
        let toml = r#"
        [codec]
        acceptable_overhead_ratio = 7.0
        block_size = 1024
        "#;
        let conf = Config::from_str(toml);
        assert_eq!(
            conf,
            Ok(Config {
                codec: CodecConfig {
                    acceptable_overhead_ratio: 7.0,
                    block_size: 1024,
                }
            })
        );
    }

    #[test]
    fn load_empty_toml_uses_defaults() {
        let conf = Config::from_str("").unwrap();
        assert_eq!(conf.codec, CodecConfig::default());
    }

    #[test]
    fn reject_unknown_fields() {
        let toml = r#"
        [codec]
        compression = "zstd"
        "#;
        assert!(matches!(
            Config::from_str(toml),
            Err(DocValuesError::ConfigParsingError(_))
        ));
    }

    #[test]
    fn reject_invalid_block_size() {
        let toml = r#"
        [codec]
        block_size = 1000
        "#;
        assert!(matches!(
            Config::from_str(toml),
            Err(DocValuesError::ConfigParsingError(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("docvalues.toml");
        std::fs::write(&path, "[codec]\nblock_size = 128\n").unwrap();
        let conf = Config::from_file(&path).unwrap();
        assert_eq!(conf.codec.block_size, 128);
    }
}
