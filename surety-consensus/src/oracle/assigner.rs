use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use surety_common::{
    crypto::hash,
    error::{Result, SuretyError},
    Address, Amount, IndexValue,
};
use tracing::info;

/// Pseudo-random source of oracle indices.
///
/// Injected into the engine so that tests can script the draws. `context` is
/// the address of the caller the draw is made for.
pub trait IndexSource: Send {
    /// Returns a value in `[0, range)`.
    fn next_index(&mut self, range: IndexValue, context: &Address) -> IndexValue;
}

/// Hash-based source: `sha256(seed || nonce || context) mod range`, with the
/// nonce bumped on every draw.
#[derive(Debug, Clone)]
pub struct HashIndexSource {
    seed: Vec<u8>,
    nonce: u64,
}

impl HashIndexSource {
    pub fn new(seed: impl Into<Vec<u8>>) -> Self {
        Self {
            seed: seed.into(),
            nonce: 0,
        }
    }
}

impl IndexSource for HashIndexSource {
    fn next_index(&mut self, range: IndexValue, context: &Address) -> IndexValue {
        let value = hash::draw(&self.seed, self.nonce, context.as_str().as_bytes(), range as u64);
        self.nonce = self.nonce.wrapping_add(1);
        value as IndexValue
    }
}

/// Replays a fixed sequence of indices, cycling when exhausted.
#[derive(Debug, Clone, Default)]
pub struct ScriptedIndexSource {
    script: VecDeque<IndexValue>,
}

impl ScriptedIndexSource {
    pub fn new(script: impl IntoIterator<Item = IndexValue>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }
}

impl IndexSource for ScriptedIndexSource {
    fn next_index(&mut self, range: IndexValue, _context: &Address) -> IndexValue {
        if range == 0 {
            return 0;
        }
        match self.script.pop_front() {
            Some(value) => {
                self.script.push_back(value);
                value % range
            }
            None => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleRegistration {
    pub address: Address,
    /// Drawn once at registration. May contain repeated values.
    pub indices: Vec<IndexValue>,
    pub fee_paid: Amount,
}

impl OracleRegistration {
    pub fn holds(&self, index: IndexValue) -> bool {
        self.indices.contains(&index)
    }
}

/// Assigns and remembers the index set of every registered oracle.
#[derive(Debug, Clone)]
pub struct OracleIndexAssigner {
    oracles: HashMap<Address, OracleRegistration>,
    indices_per_oracle: usize,
    index_range: IndexValue,
    registration_fee: Amount,
}

impl OracleIndexAssigner {
    pub fn new(indices_per_oracle: usize, index_range: IndexValue, registration_fee: Amount) -> Self {
        Self {
            oracles: HashMap::new(),
            indices_per_oracle,
            index_range,
            registration_fee,
        }
    }

    pub fn check_assign(&self, oracle: &Address, paid_fee: Amount) -> Result<()> {
        if paid_fee < self.registration_fee {
            return Err(SuretyError::InsufficientFee {
                required: self.registration_fee,
                provided: paid_fee,
            });
        }
        if self.oracles.contains_key(oracle) {
            return Err(SuretyError::OracleAlreadyRegistered(oracle.clone()));
        }
        Ok(())
    }

    /// Draws and stores the indices of `oracle`, returning them.
    pub fn assign(&mut self, oracle: &Address, paid_fee: Amount, source: &mut dyn IndexSource) -> Result<Vec<IndexValue>> {
        self.check_assign(oracle, paid_fee)?;

        let indices: Vec<IndexValue> = (0..self.indices_per_oracle)
            .map(|_| source.next_index(self.index_range, oracle))
            .collect();

        self.oracles.insert(
            oracle.clone(),
            OracleRegistration {
                address: oracle.clone(),
                indices: indices.clone(),
                fee_paid: paid_fee,
            },
        );

        info!("🔮 Oracle [{}] registered with indices {:?}", oracle, indices);
        Ok(indices)
    }

    pub fn registration(&self, oracle: &Address) -> Option<&OracleRegistration> {
        self.oracles.get(oracle)
    }

    pub fn indices_of(&self, oracle: &Address) -> Result<&[IndexValue]> {
        self.oracles
            .get(oracle)
            .map(|r| r.indices.as_slice())
            .ok_or_else(|| SuretyError::UnknownOracle(oracle.clone()))
    }

    /// Fails with `UnknownOracle` or `IndexMismatch` unless `oracle` holds `index`.
    pub fn check_holds(&self, oracle: &Address, index: IndexValue) -> Result<()> {
        let registration = self
            .oracles
            .get(oracle)
            .ok_or_else(|| SuretyError::UnknownOracle(oracle.clone()))?;

        if !registration.holds(index) {
            return Err(SuretyError::IndexMismatch {
                oracle: oracle.clone(),
                index,
            });
        }
        Ok(())
    }

    pub fn index_range(&self) -> IndexValue {
        self.index_range
    }

    pub fn len(&self) -> usize {
        self.oracles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.oracles.is_empty()
    }
}
