///! Helper library to find the result of a swap within a single tick range.
use ethnum::I256;

use super::big_num::U256;
use super::full_math::MulDiv;
use super::sqrt_price_math;
use crate::error::PoolError;

/// Fee pips are parts-per-million: a `fee_pips` of 3000 is a 0.3% fee.
pub const ONE_IN_PIPS: u32 = 1_000_000;

/// Result of a single swap step, bounded by a single initialized-tick range.
#[derive(Default, Debug, Clone, Copy)]
pub struct SwapStep {
    /// The price after swapping the amount in/out, not to exceed the price target
    pub sqrt_ratio_next_x96: U256,
    /// The amount to be swapped in, of either token0 or token1, based on swap direction
    pub amount_in: U256,
    /// The amount to be received, of either token0 or token1, based on swap direction
    pub amount_out: U256,
    /// The amount of input that will be taken as a fee
    pub fee_amount: U256,
}

/// Computes the result of swapping some amount in, or amount out, given the parameters
/// of the swap.
///
/// The fee, plus amount in, never exceeds the amount remaining if `amount_remaining`
/// is positive (an exact-input swap).
pub fn compute_swap_step(
    sqrt_ratio_current_x96: U256,
    sqrt_ratio_target_x96: U256,
    liquidity: u128,
    amount_remaining: I256,
    fee_pips: u32,
) -> Result<SwapStep, PoolError> {
    let zero_for_one = sqrt_ratio_current_x96 >= sqrt_ratio_target_x96;
    let exact_in = amount_remaining >= 0;
    let mut step = SwapStep::default();

    if exact_in {
        let amount_remaining_abs = u256_from_i256(amount_remaining);
        let amount_remaining_less_fee = amount_remaining_abs
            .mul_div_floor(
                U256::from(ONE_IN_PIPS - fee_pips),
                U256::from(ONE_IN_PIPS),
            )
            .ok_or(PoolError::WidthOverflow("uint256"))?;

        step.amount_in = if zero_for_one {
            sqrt_price_math::get_amount_0_delta_unsigned(
                sqrt_ratio_target_x96,
                sqrt_ratio_current_x96,
                liquidity,
                true,
            )?
        } else {
            sqrt_price_math::get_amount_1_delta_unsigned(
                sqrt_ratio_current_x96,
                sqrt_ratio_target_x96,
                liquidity,
                true,
            )?
        };

        step.sqrt_ratio_next_x96 = if amount_remaining_less_fee >= step.amount_in {
            sqrt_ratio_target_x96
        } else {
            sqrt_price_math::get_next_sqrt_price_from_input(
                sqrt_ratio_current_x96,
                liquidity,
                amount_remaining_less_fee,
                zero_for_one,
            )?
        };
    } else {
        let amount_remaining_abs = u256_from_i256(-amount_remaining);

        step.amount_out = if zero_for_one {
            sqrt_price_math::get_amount_1_delta_unsigned(
                sqrt_ratio_target_x96,
                sqrt_ratio_current_x96,
                liquidity,
                false,
            )?
        } else {
            sqrt_price_math::get_amount_0_delta_unsigned(
                sqrt_ratio_current_x96,
                sqrt_ratio_target_x96,
                liquidity,
                false,
            )?
        };

        step.sqrt_ratio_next_x96 = if amount_remaining_abs >= step.amount_out {
            sqrt_ratio_target_x96
        } else {
            sqrt_price_math::get_next_sqrt_price_from_output(
                sqrt_ratio_current_x96,
                liquidity,
                amount_remaining_abs,
                zero_for_one,
            )?
        };
    }

    let max = sqrt_ratio_target_x96 == step.sqrt_ratio_next_x96;

    if zero_for_one {
        if !(max && exact_in) {
            step.amount_in = sqrt_price_math::get_amount_0_delta_unsigned(
                step.sqrt_ratio_next_x96,
                sqrt_ratio_current_x96,
                liquidity,
                true,
            )?;
        }
        if !(max && !exact_in) {
            step.amount_out = sqrt_price_math::get_amount_1_delta_unsigned(
                step.sqrt_ratio_next_x96,
                sqrt_ratio_current_x96,
                liquidity,
                false,
            )?;
        }
    } else {
        if !(max && exact_in) {
            step.amount_in = sqrt_price_math::get_amount_1_delta_unsigned(
                sqrt_ratio_current_x96,
                step.sqrt_ratio_next_x96,
                liquidity,
                true,
            )?;
        }
        if !(max && !exact_in) {
            step.amount_out = sqrt_price_math::get_amount_0_delta_unsigned(
                sqrt_ratio_current_x96,
                step.sqrt_ratio_next_x96,
                liquidity,
                false,
            )?;
        }
    }

    // Cap the output amount to not exceed the remaining output amount requested.
    if !exact_in {
        let amount_remaining_abs = u256_from_i256(-amount_remaining);
        if step.amount_out > amount_remaining_abs {
            step.amount_out = amount_remaining_abs;
        }
    }

    step.fee_amount = if exact_in && step.sqrt_ratio_next_x96 != sqrt_ratio_target_x96 {
        // Didn't reach the target: the remainder of the maximum input becomes fee.
        let amount_remaining_abs = u256_from_i256(amount_remaining);
        amount_remaining_abs
            .checked_sub(step.amount_in)
            .ok_or(PoolError::WidthOverflow("uint256"))?
    } else {
        step.amount_in
            .mul_div_ceil(U256::from(fee_pips), U256::from(ONE_IN_PIPS - fee_pips))
            .ok_or(PoolError::WidthOverflow("uint256"))?
    };

    Ok(step)
}

fn u256_from_i256(value: I256) -> U256 {
    debug_assert!(value >= 0);
    let bytes = value.to_be_bytes();
    U256::from_big_endian(&bytes)
}
