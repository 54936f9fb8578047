///! Positions represent an owner's liquidity between a lower and upper tick boundary and
///! track fees owed to that position.
use crate::error::PoolError;
use crate::libraries::big_num::{WrappingOps256, U256, U512};
use crate::libraries::fixed_point;
use crate::libraries::full_math::Upcast512;
use crate::libraries::liquidity_math;

/// Info stored for each user's position
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// The amount of liquidity owned by this position
    pub liquidity: u128,
    /// The fee growth of token0/token1 inside the tick range as of the last update to
    /// liquidity or fees owed
    pub fee_growth_inside_0_last_x128: U256,
    pub fee_growth_inside_1_last_x128: U256,
    /// The fees owed to the position owner in token0/token1, wrapping modulo 2^128 by
    /// design rather than saturating or erroring.
    pub tokens_owed_0: u128,
    pub tokens_owed_1: u128,
}

impl Position {
    /// Credits accumulated fees to a user's position and applies a liquidity delta.
    pub fn update(
        &mut self,
        liquidity_delta: i128,
        fee_growth_inside_0_x128: U256,
        fee_growth_inside_1_x128: U256,
    ) -> Result<(), PoolError> {
        let liquidity_next = if liquidity_delta == 0 {
            self.liquidity
        } else {
            liquidity_math::add_delta(self.liquidity, liquidity_delta)?
        };

        let fee_growth_delta_0 = fee_growth_inside_0_x128
            .wrapping_sub_256(self.fee_growth_inside_0_last_x128);
        let fee_growth_delta_1 = fee_growth_inside_1_x128
            .wrapping_sub_256(self.fee_growth_inside_1_last_x128);

        let q128 = fixed_point::q128().as_u512();
        let liquidity_512 = U256::from(self.liquidity).as_u512();
        let tokens_owed_0_delta = (fee_growth_delta_0.as_u512() * liquidity_512) / q128;
        let tokens_owed_1_delta = (fee_growth_delta_1.as_u512() * liquidity_512) / q128;

        if liquidity_delta != 0 {
            self.liquidity = liquidity_next;
        }
        self.fee_growth_inside_0_last_x128 = fee_growth_inside_0_x128;
        self.fee_growth_inside_1_last_x128 = fee_growth_inside_1_x128;

        if !tokens_owed_0_delta.is_zero() || !tokens_owed_1_delta.is_zero() {
            // Folds down to 128 bits by design: LPs are expected to collect well before
            // tokens_owed approaches u128::MAX.
            self.tokens_owed_0 = self
                .tokens_owed_0
                .wrapping_add(fold_u512_low_128(tokens_owed_0_delta));
            self.tokens_owed_1 = self
                .tokens_owed_1
                .wrapping_add(fold_u512_low_128(tokens_owed_1_delta));
        }

        Ok(())
    }
}

fn fold_u512_low_128(value: U512) -> u128 {
    ((value.0[1] as u128) << 64) | value.0[0] as u128
}
