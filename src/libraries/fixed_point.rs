/// Constants for the Q64.96 (price) and Q128.128 (fee growth) fixed-point schemes
/// used in sqrt_price_math.rs, tick_math.rs and state::position.
use super::big_num::U256;

/// 2^96, the scale of `sqrtPriceX96`. Fits in a u128 (2^96 < 2^128).
pub const Q96: u128 = 1u128 << 96;
pub const RESOLUTION_96: u8 = 96;

pub const RESOLUTION_128: u8 = 128;

/// 2^128, the scale of fee growth accumulators. Does not fit in a u128, so this is a
/// U256 value rather than a constant.
pub fn q128() -> U256 {
    U256::one() << RESOLUTION_128
}
