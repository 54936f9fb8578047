///! Functions for managing tick processes and relevant calculations.
use crate::error::PoolError;
use crate::libraries::big_num::{WrappingOps256, U256};
use crate::libraries::{liquidity_math, tick_math};

/// Info stored for each initialized individual tick
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// The total position liquidity that references this tick
    pub liquidity_gross: u128,
    /// Amount of net liquidity added (subtracted) when tick is crossed from left to right
    /// (right to left)
    pub liquidity_net: i128,
    /// Fee growth per unit of liquidity on the _other_ side of this tick (relative to the
    /// current tick). Only has relative meaning, not absolute — the value depends on when
    /// the tick was initialized.
    pub fee_growth_outside_0_x128: U256,
    pub fee_growth_outside_1_x128: U256,
}

impl Tick {
    pub fn is_initialized(&self) -> bool {
        self.liquidity_gross != 0
    }

    /// Updates a tick and returns true if the tick was flipped from initialized to
    /// uninitialized, or vice versa.
    pub fn update(
        &mut self,
        tick: i32,
        tick_current: i32,
        liquidity_delta: i128,
        fee_growth_global_0_x128: U256,
        fee_growth_global_1_x128: U256,
        upper: bool,
        max_liquidity: u128,
    ) -> Result<bool, PoolError> {
        let liquidity_gross_before = self.liquidity_gross;
        let liquidity_gross_after = liquidity_math::add_delta(liquidity_gross_before, liquidity_delta)?;

        if liquidity_gross_after > max_liquidity {
            return Err(PoolError::LiquidityOverflowAtTick);
        }

        let flipped = (liquidity_gross_after == 0) != (liquidity_gross_before == 0);

        if liquidity_gross_before == 0 {
            // By convention, assume that all growth before a tick was initialized happened
            // below the tick.
            if tick <= tick_current {
                self.fee_growth_outside_0_x128 = fee_growth_global_0_x128;
                self.fee_growth_outside_1_x128 = fee_growth_global_1_x128;
            }
        }

        self.liquidity_gross = liquidity_gross_after;

        // When the lower (upper) tick is crossed left to right (right to left), liquidity
        // must be added (removed).
        self.liquidity_net = if upper {
            self.liquidity_net
                .checked_sub(liquidity_delta)
                .ok_or(PoolError::LiquiditySubValueErr)?
        } else {
            self.liquidity_net
                .checked_add(liquidity_delta)
                .ok_or(PoolError::LiquidityAddValueErr)?
        };

        Ok(flipped)
    }

    /// Transitions to this tick as needed by price movement, flipping its fee growth
    /// outside to be relative to the other side, and returning the net liquidity delta
    /// to apply to the pool's in-range liquidity.
    pub fn cross(
        &mut self,
        fee_growth_global_0_x128: U256,
        fee_growth_global_1_x128: U256,
    ) -> i128 {
        self.fee_growth_outside_0_x128 = fee_growth_global_0_x128.wrapping_sub_256(self.fee_growth_outside_0_x128);
        self.fee_growth_outside_1_x128 = fee_growth_global_1_x128.wrapping_sub_256(self.fee_growth_outside_1_x128);
        self.liquidity_net
    }

    /// Clears tick data, freeing the slot for reuse.
    pub fn clear(&mut self) {
        *self = Tick::default();
    }

    pub fn is_clear(&self) -> bool {
        *self == Tick::default()
    }
}

/// Retrieves fee growth data, per unit of liquidity, inside a position's tick
/// boundaries: `fr = fg - f_below(lower) - f_above(upper)`.
pub fn get_fee_growth_inside(
    tick_lower: &Tick,
    tick_lower_index: i32,
    tick_upper: &Tick,
    tick_upper_index: i32,
    tick_current: i32,
    fee_growth_global_0_x128: U256,
    fee_growth_global_1_x128: U256,
) -> (U256, U256) {
    let (fee_growth_below_0, fee_growth_below_1) = if tick_current >= tick_lower_index {
        (
            tick_lower.fee_growth_outside_0_x128,
            tick_lower.fee_growth_outside_1_x128,
        )
    } else {
        (
            fee_growth_global_0_x128.wrapping_sub_256(tick_lower.fee_growth_outside_0_x128),
            fee_growth_global_1_x128.wrapping_sub_256(tick_lower.fee_growth_outside_1_x128),
        )
    };

    let (fee_growth_above_0, fee_growth_above_1) = if tick_current < tick_upper_index {
        (
            tick_upper.fee_growth_outside_0_x128,
            tick_upper.fee_growth_outside_1_x128,
        )
    } else {
        (
            fee_growth_global_0_x128.wrapping_sub_256(tick_upper.fee_growth_outside_0_x128),
            fee_growth_global_1_x128.wrapping_sub_256(tick_upper.fee_growth_outside_1_x128),
        )
    };

    (
        fee_growth_global_0_x128
            .wrapping_sub_256(fee_growth_below_0)
            .wrapping_sub_256(fee_growth_above_0),
        fee_growth_global_1_x128
            .wrapping_sub_256(fee_growth_below_1)
            .wrapping_sub_256(fee_growth_above_1),
    )
}

/// Derives the maximum liquidity that can be attributed to a single tick for a given
/// tick spacing, so that total liquidity at a tick never exceeds `u128::MAX` even if
/// every eligible tick is fully saturated.
pub fn tick_spacing_to_max_liquidity_per_tick(tick_spacing: i32) -> u128 {
    let min_tick = (tick_math::MIN_TICK / tick_spacing) * tick_spacing;
    let max_tick = (tick_math::MAX_TICK / tick_spacing) * tick_spacing;
    let num_ticks = ((max_tick - min_tick) / tick_spacing) as u128 + 1;
    u128::MAX / num_ticks
}

/// Common checks for a valid `(tickLower, tickUpper)` pair: ordering and the absolute
/// `[MIN_TICK, MAX_TICK]` bounds. Does not check tick spacing — that is only enforced
/// when a tick flips from uninitialized to initialized (see `Pool::modify_position`).
pub fn check_ticks(tick_lower: i32, tick_upper: i32) -> Result<(), PoolError> {
    if tick_lower >= tick_upper {
        return Err(PoolError::TickLowerGteUpper);
    }
    if tick_lower < tick_math::MIN_TICK {
        return Err(PoolError::TickLowerOverflow);
    }
    if tick_upper > tick_math::MAX_TICK {
        return Err(PoolError::TickUpperOverflow);
    }
    Ok(())
}

pub fn check_tick_spacing(tick: i32, tick_spacing: i32) -> Result<(), PoolError> {
    if tick % tick_spacing != 0 {
        return Err(PoolError::TickAndSpacingNotMatch);
    }
    Ok(())
}
