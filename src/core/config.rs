use std::convert::TryFrom;

use serde::{Deserialize, Serialize};

use crate::{core::secret_sharing::SharingStrategy, error::FormatErr};

/// Engine configuration, usually read from JSON:
/// `{"strategy": "span_program"}`
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Secret sharing used to encrypt and to reconstruct at proxy decryption
    pub strategy: SharingStrategy,
}

impl EngineConfig {
    #[must_use]
    pub fn new(strategy: SharingStrategy) -> Self {
        Self { strategy }
    }
}

impl TryFrom<&[u8]> for EngineConfig {
    type Error = FormatErr;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;

    use super::EngineConfig;
    use crate::{core::secret_sharing::SharingStrategy, error::FormatErr};

    #[test]
    fn parse_config() -> Result<(), FormatErr> {
        let config = EngineConfig::try_from(&br#"{"strategy": "span_program"}"#[..])?;
        assert_eq!(config.strategy, SharingStrategy::SpanProgram);
        let config = EngineConfig::try_from(&b"{}"[..])?;
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.strategy, SharingStrategy::ThresholdTree);
        assert!(matches!(
            EngineConfig::try_from(&br#"{"strategy": "gpsw"}"#[..]),
            Err(FormatErr::InvalidConfiguration(_))
        ));
        Ok(())
    }
}
