use crate::akd::{AkdKeyPair, AkdParams, AkdProcessData, RandomValues};
use crate::akd::{generate_random_values, process_step};
use crate::config::MincryptConfig;
use crate::dh::DhCommon;
use crate::errors::MincryptError;
use crate::number_theory::Approach;
use crate::rsa::RsaKeyPair;

use rand::rngs::StdRng;

/// Configuration plus the random generator of one session.
///
/// Every random draw made through a session comes from its own generator, so two
/// sessions built from the same seeded config produce the same keys.
#[derive(Debug, Clone)]
pub struct Session {
    config: MincryptConfig,
    rng: StdRng,
}

impl Default for Session {
    fn default() -> Self {
        Self::from_valid(MincryptConfig::default())
    }
}

impl Session {
    /// Validates `config` and builds its generator.
    pub fn new(config: MincryptConfig) -> Result<Self, MincryptError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    /// Session with default limits and a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self::from_valid(MincryptConfig::seeded(seed))
    }

    fn from_valid(config: MincryptConfig) -> Self {
        let rng = config.rng();
        Self { config, rng }
    }

    pub fn config(&self) -> &MincryptConfig {
        &self.config
    }

    pub fn generate_rsa_keypair(
        &mut self,
        bits: u32,
        approach: Approach,
    ) -> Result<RsaKeyPair, MincryptError> {
        RsaKeyPair::generate_with(
            &mut self.rng,
            bits,
            approach,
            self.config.max_keygen_attempts,
        )
    }

    pub fn generate_dh_common(&mut self, bits: u32) -> Result<DhCommon, MincryptError> {
        DhCommon::generate_with(&mut self.rng, bits, self.config.small_prime_bits)
    }

    pub fn generate_random_values(
        &mut self,
        count: usize,
        max: u64,
    ) -> Result<RandomValues, MincryptError> {
        generate_random_values(&mut self.rng, count, max)
    }

    pub fn generate_akd_keypair(
        &mut self,
        count: usize,
        common: &DhCommon,
    ) -> Result<AkdKeyPair, MincryptError> {
        AkdKeyPair::generate(&mut self.rng, count, common)
    }

    pub fn process_step(&mut self, params: &AkdParams) -> Result<AkdProcessData, MincryptError> {
        process_step(&mut self.rng, &self.config, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_sessions_agree() -> Result<(), MincryptError> {
        let mut a = Session::seeded(77);
        let mut b = Session::seeded(77);

        assert_eq!(
            a.generate_rsa_keypair(40, Approach::Asymmetric)?,
            b.generate_rsa_keypair(40, Approach::Asymmetric)?
        );
        let common = a.generate_dh_common(24)?;
        assert_eq!(common, b.generate_dh_common(24)?);
        assert_eq!(
            a.generate_akd_keypair(3, &common)?,
            b.generate_akd_keypair(3, &common)?
        );
        Ok(())
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = MincryptConfig {
            max_keygen_attempts: 0,
            ..MincryptConfig::default()
        };
        assert!(Session::new(config).is_err());

        let config = MincryptConfig {
            small_prime_bits: 40,
            ..MincryptConfig::seeded(1)
        };
        assert!(matches!(Session::new(config), Err(MincryptError::InvalidParameters(_))));
    }

    #[test]
    fn test_valid_config_accepted() -> Result<(), MincryptError> {
        let mut session = Session::new(MincryptConfig::seeded(1))?;
        assert_eq!(session.config().seed, Some(1));
        assert!(session.generate_dh_common(30)?.p > 1 << 29);
        Ok(())
    }
}
