use crate::dh::DhCommon;
use crate::errors::MincryptError;

use itertools::Itertools;

use rand::Rng;

use serde::{Deserialize, Serialize};

use std::fmt;

/// Private-value pool for a group of parties.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct RandomValues {
    pub values: Vec<u64>,
}

impl RandomValues {
    pub fn count(&self) -> usize {
        self.values.len()
    }
}

/// `count` independent uniform draws from `[0, max)`.
pub fn generate_random_values(
    rng: &mut impl Rng,
    count: usize,
    max: u64,
) -> Result<RandomValues, MincryptError> {
    if max == 0 {
        return Err(MincryptError::InvalidParameters(
            "random value bound must be > 0".to_string(),
        ));
    }

    let values = (0..count).map(|_| rng.random_range(0..max)).collect();
    Ok(RandomValues { values })
}

/// Per-party key values under one set of common parameters.
///
/// Party `i` owns `private_values[i]` and publishes `public_values[i] = g^private mod p`.
/// Components that were not read from a stream stay at their defaults.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct AkdKeyPair {
    pub common: DhCommon,
    pub public_values: Vec<u64>,
    pub private_values: Vec<u64>,
}

impl AkdKeyPair {
    /// Draws `count` private values below `common.p` and derives the public values.
    pub fn generate(
        rng: &mut impl Rng,
        count: usize,
        common: &DhCommon,
    ) -> Result<Self, MincryptError> {
        let private_values = generate_random_values(rng, count, common.p)?.values;
        let public_values = private_values
            .iter()
            .map(|&private| common.public_value(private))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            common: *common,
            public_values,
            private_values,
        })
    }

    /// Number of parties.
    pub fn count(&self) -> usize {
        self.public_values.len().max(self.private_values.len())
    }

    /// Checks `public_values[i] == g^private_values[i] mod p` for every party.
    pub fn is_consistent(&self) -> bool {
        self.common.p != 0
            && self.public_values.len() == self.private_values.len()
            && self
                .public_values
                .iter()
                .zip(&self.private_values)
                .all(|(&public, &private)| {
                    matches!(self.common.public_value(private), Ok(value) if value == public)
                })
    }

    pub fn to_json(&self) -> Result<String, MincryptError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for AkdKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "AKD keypair ({} parties)", self.count())?;
        writeln!(f, "  common:  {}", self.common)?;
        writeln!(f, "  public:  [{}]", self.public_values.iter().join(", "))?;
        write!(f, "  private: [{}]", self.private_values.iter().join(", "))
    }
}
