///! Helper functions to find price changes for a change in token supply and vice versa.
use super::big_num::U256;
use super::fixed_point;
use super::full_math::MulDiv;
use super::unsafe_math::UnsafeMathTrait;
use crate::error::PoolError;

/// Gets the next sqrt price √P' given a delta of token_0.
///
/// Always rounds up because
/// 1. In the exact output case, token0 supply decreases leading to price increase.
///    Move price up so that exact output is met.
/// 2. In the exact input case, token0 supply increases leading to price decrease.
///    Do not round down to minimize price impact. We only need to meet input
///    change and not guarantee exact output.
///
/// # Formula
///
/// * `√P' = √P * L / (L + Δx * √P)`
/// * If `Δx * √P` overflows, use the alternate form `√P' = L / (L/√P + Δx)`
pub fn get_next_sqrt_price_from_amount_0_rounding_up(
    sqrt_p_x96: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> Result<U256, PoolError> {
    if amount.is_zero() {
        return Ok(sqrt_p_x96);
    }
    let numerator_1 = U256::from(liquidity) << fixed_point::RESOLUTION_96;

    if add {
        if let Some(product) = amount.checked_mul(sqrt_p_x96) {
            let denominator = numerator_1 + product;
            if denominator >= numerator_1 {
                return numerator_1
                    .mul_div_ceil(sqrt_p_x96, denominator)
                    .ok_or(PoolError::WidthOverflow("uint256"));
            }
        }
        // Alternate form if the product overflows: `√P' = L / (L/√P + Δx)`
        Ok(U256::div_rounding_up(
            numerator_1,
            (numerator_1 / sqrt_p_x96)
                .checked_add(amount)
                .ok_or(PoolError::WidthOverflow("uint256"))?,
        ))
    } else {
        let product = amount
            .checked_mul(sqrt_p_x96)
            .ok_or(PoolError::WidthOverflow("uint256"))?;
        if numerator_1 <= product {
            return Err(PoolError::WidthOverflow("uint256"));
        }
        let denominator = numerator_1 - product;
        numerator_1
            .mul_div_ceil(sqrt_p_x96, denominator)
            .ok_or(PoolError::WidthOverflow("uint256"))
    }
}

/// Gets the next sqrt price given a delta of token_1.
///
/// Always rounds down because
/// 1. In the exact output case, token1 supply decreases leading to price decrease.
///    Move price down by rounding down so that exact output of token0 is met.
/// 2. In the exact input case, token1 supply increases leading to price increase.
///    Do not round down to minimize price impact.
///
/// # Formula
///
/// * `√P' = √P + Δy / L`
pub fn get_next_sqrt_price_from_amount_1_rounding_down(
    sqrt_p_x96: U256,
    liquidity: u128,
    amount: U256,
    add: bool,
) -> Result<U256, PoolError> {
    if add {
        let quotient = (amount << fixed_point::RESOLUTION_96) / U256::from(liquidity);
        sqrt_p_x96
            .checked_add(quotient)
            .ok_or(PoolError::WidthOverflow("uint256"))
    } else {
        let quotient = U256::div_rounding_up(
            amount << fixed_point::RESOLUTION_96,
            U256::from(liquidity),
        );
        if sqrt_p_x96 <= quotient {
            return Err(PoolError::WidthOverflow("uint256"));
        }
        Ok(sqrt_p_x96 - quotient)
    }
}

/// Gets the next sqrt price given an input amount of token0 or token1.
/// Fails if price or liquidity are 0, or if the next price is out of bounds.
pub fn get_next_sqrt_price_from_input(
    sqrt_p_x96: U256,
    liquidity: u128,
    amount_in: U256,
    zero_for_one: bool,
) -> Result<U256, PoolError> {
    if sqrt_p_x96.is_zero() || liquidity == 0 {
        return Err(PoolError::WidthOverflow("uint256"));
    }
    if zero_for_one {
        get_next_sqrt_price_from_amount_0_rounding_up(sqrt_p_x96, liquidity, amount_in, true)
    } else {
        get_next_sqrt_price_from_amount_1_rounding_down(sqrt_p_x96, liquidity, amount_in, true)
    }
}

/// Gets the next sqrt price given an output amount of token0 or token1.
/// Fails if price or liquidity are 0, or if the next price is out of bounds.
pub fn get_next_sqrt_price_from_output(
    sqrt_p_x96: U256,
    liquidity: u128,
    amount_out: U256,
    zero_for_one: bool,
) -> Result<U256, PoolError> {
    if sqrt_p_x96.is_zero() || liquidity == 0 {
        return Err(PoolError::WidthOverflow("uint256"));
    }
    if zero_for_one {
        get_next_sqrt_price_from_amount_1_rounding_down(sqrt_p_x96, liquidity, amount_out, false)
    } else {
        get_next_sqrt_price_from_amount_0_rounding_up(sqrt_p_x96, liquidity, amount_out, false)
    }
}

/// Gets the amount0 delta between two prices, for the given amount of liquidity.
///
/// `Δx = L * (1/√P_lower - 1/√P_upper) = L * (√P_upper - √P_lower) / (√P_upper * √P_lower)`
pub fn get_amount_0_delta_unsigned(
    mut sqrt_ratio_a_x96: U256,
    mut sqrt_ratio_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, PoolError> {
    if sqrt_ratio_a_x96 > sqrt_ratio_b_x96 {
        std::mem::swap(&mut sqrt_ratio_a_x96, &mut sqrt_ratio_b_x96);
    }
    if sqrt_ratio_a_x96.is_zero() {
        return Err(PoolError::WidthOverflow("uint256"));
    }

    let numerator_1 = U256::from(liquidity) << fixed_point::RESOLUTION_96;
    let numerator_2 = sqrt_ratio_b_x96 - sqrt_ratio_a_x96;

    if round_up {
        Ok(U256::div_rounding_up(
            numerator_1
                .mul_div_ceil(numerator_2, sqrt_ratio_b_x96)
                .ok_or(PoolError::WidthOverflow("uint256"))?,
            sqrt_ratio_a_x96,
        ))
    } else {
        Ok(numerator_1
            .mul_div_floor(numerator_2, sqrt_ratio_b_x96)
            .ok_or(PoolError::WidthOverflow("uint256"))?
            / sqrt_ratio_a_x96)
    }
}

/// Gets the amount1 delta between two prices, for the given amount of liquidity.
///
/// `Δy = L * (√P_upper - √P_lower)`
pub fn get_amount_1_delta_unsigned(
    mut sqrt_ratio_a_x96: U256,
    mut sqrt_ratio_b_x96: U256,
    liquidity: u128,
    round_up: bool,
) -> Result<U256, PoolError> {
    if sqrt_ratio_a_x96 > sqrt_ratio_b_x96 {
        std::mem::swap(&mut sqrt_ratio_a_x96, &mut sqrt_ratio_b_x96);
    }

    let diff = sqrt_ratio_b_x96 - sqrt_ratio_a_x96;
    let q96 = U256::from(fixed_point::Q96);
    if round_up {
        U256::from(liquidity).mul_div_ceil(diff, q96)
    } else {
        U256::from(liquidity).mul_div_floor(diff, q96)
    }
    .ok_or(PoolError::WidthOverflow("uint256"))
}

/// Signed token0 delta between two prices for a given change in liquidity.
pub fn get_amount_0_delta_signed(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: i128,
) -> Result<ethnum::I256, PoolError> {
    let magnitude = get_amount_0_delta_unsigned(
        sqrt_ratio_a_x96,
        sqrt_ratio_b_x96,
        liquidity.unsigned_abs(),
        liquidity > 0,
    )?;
    Ok(to_signed(magnitude, liquidity < 0))
}

/// Signed token1 delta between two prices for a given change in liquidity.
pub fn get_amount_1_delta_signed(
    sqrt_ratio_a_x96: U256,
    sqrt_ratio_b_x96: U256,
    liquidity: i128,
) -> Result<ethnum::I256, PoolError> {
    let magnitude = get_amount_1_delta_unsigned(
        sqrt_ratio_a_x96,
        sqrt_ratio_b_x96,
        liquidity.unsigned_abs(),
        liquidity > 0,
    )?;
    Ok(to_signed(magnitude, liquidity < 0))
}

/// Converts an unsigned `uint::U256` magnitude into an `ethnum::I256`, negating if `negative`.
/// Magnitudes in this engine never approach 2^255, so the big-endian bytes of the
/// unsigned value are also a valid non-negative `I256` bit pattern.
pub fn to_signed(magnitude: U256, negative: bool) -> ethnum::I256 {
    let mut bytes = [0u8; 32];
    magnitude.to_big_endian(&mut bytes);
    let value = ethnum::I256::from_be_bytes(bytes);
    if negative {
        -value
    } else {
        value
    }
}

/// The inverse of `to_signed`: the absolute value of an `ethnum::I256` as a `uint::U256`.
pub fn unsigned_magnitude(value: ethnum::I256) -> U256 {
    let abs = if value < 0 { -value } else { value };
    U256::from_big_endian(&abs.to_be_bytes())
}
