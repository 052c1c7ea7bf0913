use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    env::status::StatusCode,
    error::{Result, SuretyError},
    utils::Amount,
};

/// Protocol constants. Every field has a default so a config file may omit
/// the whole section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParams {
    /// Registry size below which a single funded member admits a candidate.
    #[serde(default = "default_bootstrap_threshold")]
    pub bootstrap_threshold: usize,

    /// Distinct oracles that must agree before a status is finalized.
    #[serde(default = "default_quorum")]
    pub quorum: usize,

    /// Indices are drawn from `[0, index_range)`.
    #[serde(default = "default_index_range")]
    pub index_range: u8,

    #[serde(default = "default_indices_per_oracle")]
    pub indices_per_oracle: usize,
}

fn default_bootstrap_threshold() -> usize {
    4
}

fn default_quorum() -> usize {
    3
}

fn default_index_range() -> u8 {
    10
}

fn default_indices_per_oracle() -> usize {
    3
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            bootstrap_threshold: default_bootstrap_threshold(),
            quorum: default_quorum(),
            index_range: default_index_range(),
            indices_per_oracle: default_indices_per_oracle(),
        }
    }
}

/// Payout as a ratio of the premium, e.g. 3/2 pays 1.5x.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutMultiplier {
    pub numerator: u64,
    pub denominator: u64,
}

impl PayoutMultiplier {
    pub fn new(numerator: u64, denominator: u64) -> Self {
        Self { numerator, denominator }
    }

    /// `premium * numerator / denominator`, rounded down, saturating.
    pub fn apply(&self, premium: Amount) -> Amount {
        if self.denominator == 0 {
            return 0;
        }
        premium.saturating_mul(self.numerator as Amount) / self.denominator as Amount
    }
}

/// Amounts owned by the deployment. No defaults: they must be configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomicParams {
    /// Minimum amount a participant must put in to become funded.
    pub min_funding: Amount,

    /// Fee an oracle pays to receive its indices.
    pub oracle_fee: Amount,

    /// Largest premium a passenger may pay for one flight.
    pub max_premium: Amount,

    pub payout: PayoutMultiplier,

    /// Finalized status that triggers payout.
    #[serde(default = "default_payout_status")]
    pub payout_status: StatusCode,
}

fn default_payout_status() -> StatusCode {
    StatusCode::LateAirline
}

impl EconomicParams {
    pub fn new(min_funding: Amount, oracle_fee: Amount, max_premium: Amount, payout: PayoutMultiplier) -> Self {
        Self {
            min_funding,
            oracle_fee,
            max_premium,
            payout,
            payout_status: default_payout_status(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuretyConfig {
    #[serde(default)]
    pub protocol: ProtocolParams,
    pub economics: EconomicParams,
}

impl SuretyConfig {
    pub fn new(economics: EconomicParams) -> Self {
        Self {
            protocol: ProtocolParams::default(),
            economics,
        }
    }

    /// Rejects parameter combinations the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let p = &self.protocol;
        let e = &self.economics;

        if p.quorum == 0 {
            return Err(SuretyError::Config("quorum must be at least 1".into()));
        }
        if p.index_range == 0 {
            return Err(SuretyError::Config("index_range must be at least 1".into()));
        }
        if p.indices_per_oracle == 0 {
            return Err(SuretyError::Config("indices_per_oracle must be at least 1".into()));
        }
        if e.oracle_fee == 0 {
            return Err(SuretyError::Config("oracle_fee must be non-zero".into()));
        }
        if e.payout.denominator == 0 {
            return Err(SuretyError::Config("payout denominator must be non-zero".into()));
        }
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let parsed = serde_json::from_str::<SuretyConfig>(&data)?;
        parsed.validate()?;
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn economics() -> EconomicParams {
        EconomicParams::new(10, 1, 1, PayoutMultiplier::new(3, 2))
    }

    #[test]
    fn test_protocol_defaults() {
        let p = ProtocolParams::default();
        assert_eq!(p.bootstrap_threshold, 4);
        assert_eq!(p.quorum, 3);
        assert_eq!(p.index_range, 10);
        assert_eq!(p.indices_per_oracle, 3);
    }

    #[test]
    fn test_payout_multiplier() {
        let m = PayoutMultiplier::new(3, 2);
        assert_eq!(m.apply(100), 150);
        assert_eq!(m.apply(1), 1);
        assert_eq!(PayoutMultiplier::new(1, 0).apply(100), 0);
    }

    #[test]
    fn test_validate_rejects_zero_quorum_and_fee() {
        let mut cfg = SuretyConfig::new(economics());
        assert!(cfg.validate().is_ok());

        cfg.protocol.quorum = 0;
        assert!(matches!(cfg.validate(), Err(SuretyError::Config(_))));

        let mut cfg = SuretyConfig::new(economics());
        cfg.economics.oracle_fee = 0;
        assert!(matches!(cfg.validate(), Err(SuretyError::Config(_))));
    }

    #[test]
    fn test_economics_are_required() {
        let res = serde_json::from_str::<SuretyConfig>(r#"{ "protocol": {} }"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_protocol_section_may_be_omitted() {
        let json = r#"{
            "economics": {
                "min_funding": 10,
                "oracle_fee": 1,
                "max_premium": 1,
                "payout": { "numerator": 3, "denominator": 2 }
            }
        }"#;
        let cfg: SuretyConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.protocol, ProtocolParams::default());
        assert_eq!(cfg.economics.payout_status, StatusCode::LateAirline);
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("surety.json");

        let cfg = SuretyConfig::new(economics());
        cfg.save_to_file(&path).unwrap();

        let loaded = SuretyConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, cfg);
    }
}
