use crate::error::PoolError;
use crate::libraries::big_num::U256;

/// The minimum tick
pub const MIN_TICK: i32 = -887272;
/// The maximum tick
pub const MAX_TICK: i32 = -MIN_TICK;

/// The minimum value that can be returned from `get_sqrt_ratio_at_tick`.
/// Equivalent to `get_sqrt_ratio_at_tick(MIN_TICK)`
pub const MIN_SQRT_RATIO: u128 = 4295128739;

/// The maximum value that can be returned from `get_sqrt_ratio_at_tick`.
/// Equivalent to `get_sqrt_ratio_at_tick(MAX_TICK)`. A function rather than a `u128`
/// constant because the value (~2^159) does not fit in 128 bits.
pub fn max_sqrt_ratio() -> U256 {
    U256::from_dec_str("1461446703485210103287273052203988822378723970342").unwrap()
}

/// Calculates `sqrt(1.0001^tick) * 2^96` as a Q64.96 unsigned fixed point number.
///
/// Each magic factor below is `2^128 / (1.0001^(2^(i-1)))` for `i` in `[0, 20)`,
/// applied against a running Q128.128 ratio that is truncated down to Q128.96 at
/// the end. Fails with `T` if `|tick| > MAX_TICK`.
pub fn get_sqrt_ratio_at_tick(tick: i32) -> Result<U256, PoolError> {
    let abs_tick = tick.unsigned_abs();
    if abs_tick > MAX_TICK as u32 {
        return Err(PoolError::TickOutOfRange);
    }

    let mut ratio = if abs_tick & 0x1 != 0 {
        U256::from_dec_str("340265354078544963557816517032075149313").unwrap()
    } else {
        U256::one() << 128
    };

    let step = |ratio: U256, dec: &str| -> U256 { (ratio * U256::from_dec_str(dec).unwrap()) >> 128 };

    if abs_tick & 0x2 != 0 {
        ratio = step(ratio, "340248342086729790484326174814286782778");
    }
    if abs_tick & 0x4 != 0 {
        ratio = step(ratio, "340214320654664324051920982716015181260");
    }
    if abs_tick & 0x8 != 0 {
        ratio = step(ratio, "340146287995602323631171512101879684304");
    }
    if abs_tick & 0x10 != 0 {
        ratio = step(ratio, "340010263488231146823593991679159461444");
    }
    if abs_tick & 0x20 != 0 {
        ratio = step(ratio, "339738377640345403697157401104375502016");
    }
    if abs_tick & 0x40 != 0 {
        ratio = step(ratio, "339195258003219555707034227454543997025");
    }
    if abs_tick & 0x80 != 0 {
        ratio = step(ratio, "338111622100601834656805679988414885971");
    }
    if abs_tick & 0x100 != 0 {
        ratio = step(ratio, "335954724994790223023589805789778977700");
    }
    if abs_tick & 0x200 != 0 {
        ratio = step(ratio, "331682121138379247127172139078559817300");
    }
    if abs_tick & 0x400 != 0 {
        ratio = step(ratio, "323299236684853023288211250268160618739");
    }
    if abs_tick & 0x800 != 0 {
        ratio = step(ratio, "307163716377032989948697243942600083929");
    }
    if abs_tick & 0x1000 != 0 {
        ratio = step(ratio, "277268403626896220162999269216087595045");
    }
    if abs_tick & 0x2000 != 0 {
        ratio = step(ratio, "225923453940442621947126027127485391333");
    }
    if abs_tick & 0x4000 != 0 {
        ratio = step(ratio, "149997214084966997727330242082538205943");
    }
    if abs_tick & 0x8000 != 0 {
        ratio = step(ratio, "66119101136024775622716233608466517926");
    }
    if abs_tick & 0x10000 != 0 {
        ratio = step(ratio, "12847376061809297530290974190478138313");
    }
    if abs_tick & 0x20000 != 0 {
        ratio = step(ratio, "485053260817066172746253684029974020");
    }
    if abs_tick & 0x40000 != 0 {
        ratio = step(ratio, "691415978906521570653435304214168");
    }
    if abs_tick & 0x80000 != 0 {
        ratio = step(ratio, "1404880482679654955896180642");
    }

    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128.128 -> Q128.96, rounding up so get_tick_at_sqrt_ratio(result) is always consistent.
    let remainder = if (ratio % (U256::one() << 32)).is_zero() {
        U256::zero()
    } else {
        U256::one()
    };
    Ok((ratio >> 32) + remainder)
}

/// Calculates the greatest tick value such that `get_sqrt_ratio_at_tick(tick) <= ratio`.
///
/// Fails with `R` if `sqrt_price_x96 < MIN_SQRT_RATIO` or `sqrt_price_x96 >= MAX_SQRT_RATIO`
/// (the price can never reach the price at the max tick).
pub fn get_tick_at_sqrt_ratio(sqrt_price_x96: U256) -> Result<i32, PoolError> {
    if sqrt_price_x96 < U256::from(MIN_SQRT_RATIO) || sqrt_price_x96 >= max_sqrt_ratio() {
        return Err(PoolError::SqrtPriceOutOfRange);
    }

    let ratio = sqrt_price_x96 << 32;

    let mut r = ratio;
    let mut msb: u32 = 0;
    let add_bit = |r: U256, msb: u32, mask: U256, bit: u32| -> (U256, u32) {
        if r > mask {
            (r >> bit, msb | (1 << bit))
        } else {
            (r, msb)
        }
    };
    (r, msb) = add_bit(r, msb, (U256::one() << 128) - 1, 7);
    (r, msb) = add_bit(r, msb, U256::from(u64::MAX), 6);
    (r, msb) = add_bit(r, msb, U256::from(u32::MAX), 5);
    (r, msb) = add_bit(r, msb, U256::from(u16::MAX), 4);
    (r, msb) = add_bit(r, msb, U256::from(0xFFu32), 3);
    (r, msb) = add_bit(r, msb, U256::from(0xFu32), 2);
    (r, msb) = add_bit(r, msb, U256::from(0x3u32), 1);
    (r, msb) = add_bit(r, msb, U256::from(0x1u32), 0);

    let mut r: U256 = if msb >= 128 {
        ratio >> (msb - 127)
    } else {
        ratio << (127 - msb)
    };

    // log_2 is signed in the reference, carried here as i128 before the final shift
    let mut log_2: i128 = (msb as i128 - 128) << 64;

    for bit in (50..=63).rev() {
        r = (r * r) >> 127;
        let f = (r >> 128).low_u32();
        log_2 |= (f as i128) << bit;
        // Difference in calculation when bit == 50, matching the reference exactly.
        if bit != 50 {
            r >>= f;
        }
    }

    let log_sqrt10001 = log_2.wrapping_mul(255738958999603826347141i128);

    let tick_low = ((log_sqrt10001 - 3402992956809132418596140100660247210i128) >> 128) as i32;
    let tick_high = ((log_sqrt10001 + 291339464771989622907027621153398088495i128) >> 128) as i32;

    Ok(if tick_low == tick_high {
        tick_low
    } else if get_sqrt_ratio_at_tick(tick_high)? <= sqrt_price_x96 {
        tick_high
    } else {
        tick_low
    })
}
