///! Deploys pools and manages the registry of allowed `(fee, tickSpacing)` combinations.
use std::collections::HashMap;

use crate::address::Address;
use crate::error::{PoolError, PoolResult};
use crate::state::pool::Pool;

/// Registry of `fee -> tickSpacing`, seeded with the three defaults the reference
/// deployment enables at genesis.
#[derive(Debug, Clone)]
pub struct FeeConfig {
    tick_spacings: HashMap<u32, i32>,
}

impl Default for FeeConfig {
    fn default() -> Self {
        let mut tick_spacings = HashMap::new();
        tick_spacings.insert(500, 10);
        tick_spacings.insert(3000, 60);
        tick_spacings.insert(10000, 200);
        FeeConfig { tick_spacings }
    }
}

impl FeeConfig {
    pub fn tick_spacing(&self, fee: u32) -> Option<i32> {
        self.tick_spacings.get(&fee).copied()
    }

    /// Enables a fee amount with the given tick spacing. Fee amounts may never be
    /// replaced once enabled.
    pub fn enable_fee_amount(&mut self, fee: u32, tick_spacing: i32) -> PoolResult<()> {
        if fee >= 1_000_000 {
            return Err(PoolError::InvalidFeeAmount);
        }
        if tick_spacing <= 0 || tick_spacing >= 16384 {
            return Err(PoolError::InvalidFeeAmount);
        }
        if self.tick_spacings.contains_key(&fee) {
            return Err(PoolError::FeeAmountAlreadyEnabled);
        }
        self.tick_spacings.insert(fee, tick_spacing);
        Ok(())
    }
}

/// Deploys `Pool` instances and enumerates the fee tiers they may be created with.
#[derive(Debug, Default, Clone)]
pub struct Factory {
    pub fee_config: FeeConfig,
    pools: Vec<(Address, Address, u32)>,
}

impl Factory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an uninitialized pool for `(token_a, token_b)` at `fee`. `token_a` and
    /// `token_b` may be passed in either order; they are sorted into `(token0, token1)`
    /// by byte order. Fails if the tokens are identical, the fee tier is unsupported, or
    /// a pool already exists for this exact `(token0, token1, fee)` triple.
    pub fn create_pool(
        &mut self,
        address: Address,
        token_a: Address,
        token_b: Address,
        fee: u32,
    ) -> PoolResult<Pool> {
        if token_a == token_b {
            return Err(PoolError::IdenticalTokens);
        }
        let (token0, token1) = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };

        let tick_spacing = self
            .fee_config
            .tick_spacing(fee)
            .ok_or(PoolError::FeeAmountNotSupported)?;

        if self.pools.contains(&(token0, token1, fee)) {
            return Err(PoolError::PoolAlreadyExists);
        }
        self.pools.push((token0, token1, fee));

        Ok(Pool::new(address, token0, token1, fee, tick_spacing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        let mut bytes = [0u8; 32];
        bytes[0] = byte;
        Address::new(bytes)
    }

    #[test]
    fn sorts_tokens_by_byte_order() {
        let mut factory = Factory::new();
        let pool = factory
            .create_pool(addr(0), addr(9), addr(1), 3000)
            .unwrap();
        assert_eq!(pool.token0, addr(1));
        assert_eq!(pool.token1, addr(9));
        assert_eq!(pool.tick_spacing, 60);
    }

    #[test]
    fn rejects_unsupported_fee() {
        let mut factory = Factory::new();
        assert_eq!(
            factory.create_pool(addr(0), addr(1), addr(2), 1234),
            Err(PoolError::FeeAmountNotSupported)
        );
    }

    #[test]
    fn rejects_duplicate_pool() {
        let mut factory = Factory::new();
        factory.create_pool(addr(0), addr(1), addr(2), 500).unwrap();
        assert_eq!(
            factory.create_pool(addr(3), addr(1), addr(2), 500),
            Err(PoolError::PoolAlreadyExists)
        );
    }

    #[test]
    fn rejects_identical_tokens() {
        let mut factory = Factory::new();
        assert_eq!(
            factory.create_pool(addr(0), addr(1), addr(1), 500),
            Err(PoolError::IdenticalTokens)
        );
    }

    #[test]
    fn enable_fee_amount_rejects_oversized_tick_spacing() {
        let mut config = FeeConfig::default();
        assert_eq!(
            config.enable_fee_amount(100, 16384),
            Err(PoolError::InvalidFeeAmount)
        );
    }

    #[test]
    fn enable_fee_amount_rejects_replacing_an_existing_entry() {
        let mut config = FeeConfig::default();
        assert_eq!(
            config.enable_fee_amount(500, 20),
            Err(PoolError::FeeAmountAlreadyEnabled)
        );
    }

    #[test]
    fn enable_fee_amount_adds_a_new_tier() {
        let mut config = FeeConfig::default();
        config.enable_fee_amount(100, 1).unwrap();
        assert_eq!(config.tick_spacing(100), Some(1));
    }
}
