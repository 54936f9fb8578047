///! The pool: the orchestrator tying together slot0 (current price and tick), the tick
///! table, the position table, and the global fee-growth and protocol-fee accumulators
///! across initialize/mint/burn/collect/swap.
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::ops::Bound;

use ethnum::I256;
use tracing::{instrument, trace};

use crate::address::{Address, PositionKey};
use crate::error::{PoolError, PoolResult};
use crate::ledger::Ledger;
use crate::libraries::big_num::{WrappingOps256, U256};
use crate::libraries::fixed_point;
use crate::libraries::full_math::MulDiv;
use crate::libraries::{liquidity_math, sqrt_price_math, swap_math, tick_math};
use crate::state::position::Position;
use crate::state::tick::{self as tick, Tick};

/// The pool's current price, tick, and protocol fee split — the working set a swap
/// consults on every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot0 {
    pub sqrt_price_x96: U256,
    pub tick: i32,
    /// `feeProtocol1 << 4 | feeProtocol0`; each nibble is 0 (off) or in `[4, 10]`.
    pub fee_protocol: u8,
}

impl Default for Slot0 {
    fn default() -> Self {
        Slot0 {
            sqrt_price_x96: U256::zero(),
            tick: 0,
            fee_protocol: 0,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolFees {
    pub token0: u128,
    pub token1: u128,
}

/// A concentrated-liquidity pool for one `(token0, token1, fee)` pair.
///
/// Every public method that mutates the pool is atomic: it runs against a scratch
/// clone and only replaces `self` once every fallible step (including the ledger
/// transfers) has succeeded, so a failing call leaves the pool exactly as it was.
#[derive(Debug, Clone)]
pub struct Pool {
    pub address: Address,
    pub token0: Address,
    pub token1: Address,
    pub fee: u32,
    pub tick_spacing: i32,
    pub max_liquidity_per_tick: u128,

    pub slot0: Slot0,
    pub fee_growth_global_0_x128: U256,
    pub fee_growth_global_1_x128: U256,
    pub protocol_fees: ProtocolFees,
    /// Liquidity currently in range (the current tick lies within some minted position).
    pub liquidity: u128,

    pub ticks: BTreeMap<i32, Tick>,
    pub positions: HashMap<PositionKey, Position>,
}

impl Pool {
    pub fn new(address: Address, token0: Address, token1: Address, fee: u32, tick_spacing: i32) -> Self {
        Pool {
            address,
            token0,
            token1,
            fee,
            tick_spacing,
            max_liquidity_per_tick: tick::tick_spacing_to_max_liquidity_per_tick(tick_spacing),
            slot0: Slot0::default(),
            fee_growth_global_0_x128: U256::zero(),
            fee_growth_global_1_x128: U256::zero(),
            protocol_fees: ProtocolFees::default(),
            liquidity: 0,
            ticks: BTreeMap::new(),
            positions: HashMap::new(),
        }
    }

    /// Sets the pool's starting price. May only be called once, before any mint.
    #[instrument(skip(self), fields(pool = %self.address))]
    pub fn initialize(&mut self, sqrt_price_x96: U256) -> PoolResult<()> {
        if !self.slot0.sqrt_price_x96.is_zero() {
            return Err(PoolError::AlreadyInitialized);
        }
        let tick = tick_math::get_tick_at_sqrt_ratio(sqrt_price_x96)?;
        self.slot0 = Slot0 {
            sqrt_price_x96,
            tick,
            fee_protocol: 0,
        };
        trace!(tick, %sqrt_price_x96, "pool initialized");
        Ok(())
    }

    fn position_key(owner: Address, tick_lower: i32, tick_upper: i32) -> PositionKey {
        PositionKey::new(owner, tick_lower, tick_upper)
    }

    /// Adds `amount` of liquidity to `recipient`'s position over `[tick_lower, tick_upper)`,
    /// crediting the caller with the owed token amounts, then pulling them through `ledger`.
    #[instrument(skip(self, ledger), fields(pool = %self.address))]
    pub fn mint<L: Ledger>(
        &mut self,
        ledger: &mut L,
        recipient: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
    ) -> PoolResult<(U256, U256)> {
        if amount == 0 {
            return Err(PoolError::MintAmountMustBePositive);
        }

        let mut next = self.clone();
        let liquidity_delta = liquidity_delta_from_amount(amount)?;
        let (amount_0_signed, amount_1_signed) =
            next.modify_position(recipient, tick_lower, tick_upper, liquidity_delta)?;

        let amount_0 = sqrt_price_math::unsigned_magnitude(amount_0_signed);
        let amount_1 = sqrt_price_math::unsigned_magnitude(amount_1_signed);

        if !amount_0.is_zero() {
            ledger.transfer_token(recipient, next.address, next.token0, amount_0)?;
        }
        if !amount_1.is_zero() {
            ledger.transfer_token(recipient, next.address, next.token1, amount_1)?;
        }

        trace!(%amount_0, %amount_1, "minted");
        *self = next;
        Ok((amount_0, amount_1))
    }

    /// Removes `amount` of liquidity from the caller's position, crediting the owed
    /// token amounts to `tokens_owed` rather than transferring them — the caller must
    /// follow up with `collect`. A burn of `0` still exists to "poke" a position and
    /// refresh its accrued fees.
    #[instrument(skip(self), fields(pool = %self.address))]
    pub fn burn(
        &mut self,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount: u128,
    ) -> PoolResult<(U256, U256)> {
        let mut next = self.clone();
        let key = Self::position_key(owner, tick_lower, tick_upper);
        if !next.positions.contains_key(&key) {
            return Err(PoolError::PositionDoesNotExist);
        }

        let liquidity_delta = -liquidity_delta_from_amount(amount)?;
        let (amount_0_signed, amount_1_signed) =
            next.modify_position(owner, tick_lower, tick_upper, liquidity_delta)?;

        let amount_0 = sqrt_price_math::unsigned_magnitude(amount_0_signed);
        let amount_1 = sqrt_price_math::unsigned_magnitude(amount_1_signed);

        if !amount_0.is_zero() || !amount_1.is_zero() {
            let position = next
                .positions
                .get_mut(&key)
                .expect("modify_position keeps the position entry it just updated");
            position.tokens_owed_0 = position
                .tokens_owed_0
                .wrapping_add(fold_u256_low_128(amount_0));
            position.tokens_owed_1 = position
                .tokens_owed_1
                .wrapping_add(fold_u256_low_128(amount_1));
        }

        trace!(%amount_0, %amount_1, "burned");
        *self = next;
        Ok((amount_0, amount_1))
    }

    /// Pays out up to `(amount_0_requested, amount_1_requested)` of a position's accrued
    /// `tokens_owed`, capped by what is actually owed.
    #[instrument(skip(self, ledger), fields(pool = %self.address))]
    pub fn collect<L: Ledger>(
        &mut self,
        ledger: &mut L,
        recipient: Address,
        tick_lower: i32,
        tick_upper: i32,
        amount_0_requested: u128,
        amount_1_requested: u128,
    ) -> PoolResult<(u128, u128)> {
        let mut next = self.clone();
        let key = Self::position_key(recipient, tick_lower, tick_upper);

        let (amount_0, amount_1) = {
            let position = next
                .positions
                .get_mut(&key)
                .ok_or(PoolError::PositionDoesNotExist)?;
            let amount_0 = amount_0_requested.min(position.tokens_owed_0);
            let amount_1 = amount_1_requested.min(position.tokens_owed_1);
            position.tokens_owed_0 -= amount_0;
            position.tokens_owed_1 -= amount_1;
            (amount_0, amount_1)
        };

        if amount_0 > 0 {
            ledger.transfer_token(next.address, recipient, next.token0, U256::from(amount_0))?;
        }
        if amount_1 > 0 {
            ledger.transfer_token(next.address, recipient, next.token1, U256::from(amount_1))?;
        }

        *self = next;
        Ok((amount_0, amount_1))
    }

    /// Sets the fraction (1/N, N in `[4, 10]`, or 0 to disable) of the swap fee that
    /// accrues to the protocol rather than to liquidity providers.
    pub fn set_fee_protocol(&mut self, fee_protocol_0: u8, fee_protocol_1: u8) -> PoolResult<(u8, u8)> {
        let valid = |v: u8| v == 0 || (4..=10).contains(&v);
        if !valid(fee_protocol_0) || !valid(fee_protocol_1) {
            return Err(PoolError::InvalidFeeProtocol);
        }
        let fee_protocol_old = (self.slot0.fee_protocol % 16, self.slot0.fee_protocol >> 4);
        self.slot0.fee_protocol = fee_protocol_0 | (fee_protocol_1 << 4);
        Ok(fee_protocol_old)
    }

    /// Pays accumulated protocol fees to `recipient`, capped by what is requested and by
    /// what has accrued. Always leaves at least 1 wei behind per token, as a gas
    /// optimization carried over from the reference implementation (an all-zero slot is
    /// more expensive to write to than a nonzero one).
    #[instrument(skip(self, ledger), fields(pool = %self.address))]
    pub fn collect_protocol<L: Ledger>(
        &mut self,
        ledger: &mut L,
        recipient: Address,
        amount_0_requested: u128,
        amount_1_requested: u128,
    ) -> PoolResult<(u128, u128)> {
        let mut next = self.clone();

        let mut amount_0 = amount_0_requested.min(next.protocol_fees.token0);
        let mut amount_1 = amount_1_requested.min(next.protocol_fees.token1);

        if amount_0 > 0 {
            if amount_0 == next.protocol_fees.token0 {
                amount_0 -= 1;
            }
            next.protocol_fees.token0 -= amount_0;
        }
        if amount_1 > 0 {
            if amount_1 == next.protocol_fees.token1 {
                amount_1 -= 1;
            }
            next.protocol_fees.token1 -= amount_1;
        }

        if amount_0 > 0 {
            ledger.transfer_token(next.address, recipient, next.token0, U256::from(amount_0))?;
        }
        if amount_1 > 0 {
            ledger.transfer_token(next.address, recipient, next.token1, U256::from(amount_1))?;
        }

        *self = next;
        Ok((amount_0, amount_1))
    }

    /// Swaps token0 for token1, or vice versa, up to `amount_specified` (positive for
    /// exact input, negative for exact output), never moving price past
    /// `sqrt_price_limit_x96`. Returns the signed amounts of token0/token1 that moved:
    /// positive means the pool received that amount from `recipient`, negative means the
    /// pool paid it out.
    #[instrument(skip(self, ledger), fields(pool = %self.address))]
    pub fn swap<L: Ledger>(
        &mut self,
        ledger: &mut L,
        recipient: Address,
        zero_for_one: bool,
        amount_specified: I256,
        sqrt_price_limit_x96: U256,
    ) -> PoolResult<(I256, I256)> {
        if amount_specified == I256::ZERO {
            return Err(PoolError::InvalidSwapAmountSpecified);
        }

        let mut next = self.clone();
        let slot0_start = next.slot0;

        if zero_for_one {
            if !(sqrt_price_limit_x96 < slot0_start.sqrt_price_x96
                && sqrt_price_limit_x96 > U256::from(tick_math::MIN_SQRT_RATIO))
            {
                return Err(PoolError::SqrtPriceLimitOverflow);
            }
        } else if !(sqrt_price_limit_x96 > slot0_start.sqrt_price_x96
            && sqrt_price_limit_x96 < tick_math::max_sqrt_ratio())
        {
            return Err(PoolError::SqrtPriceLimitOverflow);
        }

        let fee_protocol = if zero_for_one {
            slot0_start.fee_protocol % 16
        } else {
            slot0_start.fee_protocol >> 4
        };

        let exact_input = amount_specified > I256::ZERO;

        let mut state = SwapState {
            amount_specified_remaining: amount_specified,
            amount_calculated: I256::ZERO,
            sqrt_price_x96: slot0_start.sqrt_price_x96,
            tick: slot0_start.tick,
            fee_growth_global_x128: if zero_for_one {
                next.fee_growth_global_0_x128
            } else {
                next.fee_growth_global_1_x128
            },
            protocol_fee: 0,
            liquidity: next.liquidity,
        };

        while state.amount_specified_remaining != I256::ZERO && state.sqrt_price_x96 != sqrt_price_limit_x96 {
            let sqrt_price_start_x96 = state.sqrt_price_x96;

            let (tick_next, initialized) = next.next_initialized_tick(state.tick, zero_for_one);
            let sqrt_price_next_x96 = tick_math::get_sqrt_ratio_at_tick(tick_next)?;

            let sqrt_ratio_target_x96 = if zero_for_one {
                if sqrt_price_next_x96 < sqrt_price_limit_x96 {
                    sqrt_price_limit_x96
                } else {
                    sqrt_price_next_x96
                }
            } else if sqrt_price_next_x96 > sqrt_price_limit_x96 {
                sqrt_price_limit_x96
            } else {
                sqrt_price_next_x96
            };

            let step = swap_math::compute_swap_step(
                state.sqrt_price_x96,
                sqrt_ratio_target_x96,
                state.liquidity,
                state.amount_specified_remaining,
                next.fee,
            )?;
            state.sqrt_price_x96 = step.sqrt_ratio_next_x96;

            let amount_in = sqrt_price_math::to_signed(step.amount_in, false);
            let amount_out = sqrt_price_math::to_signed(step.amount_out, false);
            let fee_amount_signed = sqrt_price_math::to_signed(step.fee_amount, false);

            if exact_input {
                state.amount_specified_remaining = state
                    .amount_specified_remaining
                    .checked_sub(amount_in + fee_amount_signed)
                    .ok_or(PoolError::WidthOverflow("int256"))?;
                state.amount_calculated = state
                    .amount_calculated
                    .checked_sub(amount_out)
                    .ok_or(PoolError::WidthOverflow("int256"))?;
            } else {
                state.amount_specified_remaining = state
                    .amount_specified_remaining
                    .checked_add(amount_out)
                    .ok_or(PoolError::WidthOverflow("int256"))?;
                state.amount_calculated = state
                    .amount_calculated
                    .checked_add(amount_in + fee_amount_signed)
                    .ok_or(PoolError::WidthOverflow("int256"))?;
            }

            let mut fee_amount = step.fee_amount;
            if fee_protocol > 0 {
                let delta = fee_amount / U256::from(fee_protocol);
                fee_amount -= delta;
                state.protocol_fee = state.protocol_fee.wrapping_add(fold_u256_low_128(delta));
            }

            if state.liquidity > 0 {
                let growth = fee_amount
                    .mul_div_floor(fixed_point::q128(), U256::from(state.liquidity))
                    .ok_or(PoolError::WidthOverflow("uint256"))?;
                state.fee_growth_global_x128 = state.fee_growth_global_x128.wrapping_add_256(growth);
            }

            if state.sqrt_price_x96 == sqrt_price_next_x96 {
                if initialized {
                    let (fee_growth_0, fee_growth_1) = if zero_for_one {
                        (state.fee_growth_global_x128, next.fee_growth_global_1_x128)
                    } else {
                        (next.fee_growth_global_0_x128, state.fee_growth_global_x128)
                    };
                    let tick_entry = next
                        .ticks
                        .get_mut(&tick_next)
                        .expect("next_initialized_tick only returns ticks present in the map");
                    let mut liquidity_net = tick_entry.cross(fee_growth_0, fee_growth_1);
                    if zero_for_one {
                        liquidity_net = liquidity_net
                            .checked_neg()
                            .ok_or(PoolError::WidthOverflow("int128"))?;
                    }
                    state.liquidity = liquidity_math::add_delta(state.liquidity, liquidity_net)?;
                }
                state.tick = if zero_for_one { tick_next - 1 } else { tick_next };
            } else if state.sqrt_price_x96 != sqrt_price_start_x96 {
                state.tick = tick_math::get_tick_at_sqrt_ratio(state.sqrt_price_x96)?;
            }

            trace!(tick = state.tick, sqrt_price = %state.sqrt_price_x96, "swap step");
        }

        next.slot0.sqrt_price_x96 = state.sqrt_price_x96;
        next.slot0.tick = state.tick;
        next.liquidity = state.liquidity;

        if zero_for_one {
            next.fee_growth_global_0_x128 = state.fee_growth_global_x128;
            next.protocol_fees.token0 = next.protocol_fees.token0.wrapping_add(state.protocol_fee);
        } else {
            next.fee_growth_global_1_x128 = state.fee_growth_global_x128;
            next.protocol_fees.token1 = next.protocol_fees.token1.wrapping_add(state.protocol_fee);
        }

        let (amount_0, amount_1) = if zero_for_one == exact_input {
            (
                amount_specified
                    .checked_sub(state.amount_specified_remaining)
                    .ok_or(PoolError::WidthOverflow("int256"))?,
                state.amount_calculated,
            )
        } else {
            (
                state.amount_calculated,
                amount_specified
                    .checked_sub(state.amount_specified_remaining)
                    .ok_or(PoolError::WidthOverflow("int256"))?,
            )
        };

        if zero_for_one {
            if amount_1 < I256::ZERO {
                ledger.transfer_token(
                    next.address,
                    recipient,
                    next.token1,
                    sqrt_price_math::unsigned_magnitude(amount_1),
                )?;
            }
            let balance_before = ledger.balance_of(next.address, next.token0);
            let amount_0_abs = sqrt_price_math::unsigned_magnitude(amount_0);
            ledger.transfer_token(recipient, next.address, next.token0, amount_0_abs)?;
            if ledger.balance_of(next.address, next.token0) != balance_before + amount_0_abs {
                return Err(PoolError::InsufficientInputAmount);
            }
        } else {
            if amount_0 < I256::ZERO {
                ledger.transfer_token(
                    next.address,
                    recipient,
                    next.token0,
                    sqrt_price_math::unsigned_magnitude(amount_0),
                )?;
            }
            let balance_before = ledger.balance_of(next.address, next.token1);
            let amount_1_abs = sqrt_price_math::unsigned_magnitude(amount_1);
            ledger.transfer_token(recipient, next.address, next.token1, amount_1_abs)?;
            if ledger.balance_of(next.address, next.token1) != balance_before + amount_1_abs {
                return Err(PoolError::InsufficientInputAmount);
            }
        }

        trace!(%amount_0, %amount_1, tick = next.slot0.tick, "swapped");
        *self = next;
        Ok((amount_0, amount_1))
    }

    /// Applies a liquidity delta to `owner`'s position over `[tick_lower, tick_upper)`,
    /// returning the signed token0/token1 amounts owed, computed from the pool's current
    /// price relative to the position's range.
    fn modify_position(
        &mut self,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        liquidity_delta: i128,
    ) -> PoolResult<(I256, I256)> {
        tick::check_ticks(tick_lower, tick_upper)?;

        self.update_position(owner, tick_lower, tick_upper, liquidity_delta)?;

        let mut amount_0 = I256::ZERO;
        let mut amount_1 = I256::ZERO;

        if liquidity_delta != 0 {
            let tick_current = self.slot0.tick;
            let sqrt_ratio_lower = tick_math::get_sqrt_ratio_at_tick(tick_lower)?;
            let sqrt_ratio_upper = tick_math::get_sqrt_ratio_at_tick(tick_upper)?;

            if tick_current < tick_lower {
                amount_0 = sqrt_price_math::get_amount_0_delta_signed(
                    sqrt_ratio_lower,
                    sqrt_ratio_upper,
                    liquidity_delta,
                )?;
            } else if tick_current < tick_upper {
                let sqrt_price_x96 = self.slot0.sqrt_price_x96;
                amount_0 = sqrt_price_math::get_amount_0_delta_signed(
                    sqrt_price_x96,
                    sqrt_ratio_upper,
                    liquidity_delta,
                )?;
                amount_1 = sqrt_price_math::get_amount_1_delta_signed(
                    sqrt_ratio_lower,
                    sqrt_price_x96,
                    liquidity_delta,
                )?;
                self.liquidity = liquidity_math::add_delta(self.liquidity, liquidity_delta)?;
            } else {
                amount_1 = sqrt_price_math::get_amount_1_delta_signed(
                    sqrt_ratio_lower,
                    sqrt_ratio_upper,
                    liquidity_delta,
                )?;
            }
        }

        Ok((amount_0, amount_1))
    }

    /// Updates the boundary ticks (lazily creating them, and checking tick spacing only
    /// when one flips) and the caller's position, then clears any tick that flips back
    /// to uninitialized when liquidity is withdrawn.
    fn update_position(
        &mut self,
        owner: Address,
        tick_lower: i32,
        tick_upper: i32,
        liquidity_delta: i128,
    ) -> PoolResult<()> {
        let tick_current = self.slot0.tick;
        let fee_growth_global_0 = self.fee_growth_global_0_x128;
        let fee_growth_global_1 = self.fee_growth_global_1_x128;
        let max_liquidity = self.max_liquidity_per_tick;
        let tick_spacing = self.tick_spacing;

        let mut flipped_lower = false;
        let mut flipped_upper = false;

        if liquidity_delta != 0 {
            flipped_lower = self.ticks.entry(tick_lower).or_default().update(
                tick_lower,
                tick_current,
                liquidity_delta,
                fee_growth_global_0,
                fee_growth_global_1,
                false,
                max_liquidity,
            )?;
            flipped_upper = self.ticks.entry(tick_upper).or_default().update(
                tick_upper,
                tick_current,
                liquidity_delta,
                fee_growth_global_0,
                fee_growth_global_1,
                true,
                max_liquidity,
            )?;
        }

        if flipped_lower {
            tick::check_tick_spacing(tick_lower, tick_spacing)?;
        }
        if flipped_upper {
            tick::check_tick_spacing(tick_upper, tick_spacing)?;
        }

        let (fee_growth_inside_0, fee_growth_inside_1) = {
            let lower = self.ticks.get(&tick_lower).copied().unwrap_or_default();
            let upper = self.ticks.get(&tick_upper).copied().unwrap_or_default();
            tick::get_fee_growth_inside(
                &lower,
                tick_lower,
                &upper,
                tick_upper,
                tick_current,
                fee_growth_global_0,
                fee_growth_global_1,
            )
        };

        let key = Self::position_key(owner, tick_lower, tick_upper);
        self.positions
            .entry(key)
            .or_default()
            .update(liquidity_delta, fee_growth_inside_0, fee_growth_inside_1)?;

        if liquidity_delta < 0 {
            if flipped_lower {
                self.ticks.remove(&tick_lower);
            }
            if flipped_upper {
                self.ticks.remove(&tick_upper);
            }
        }

        Ok(())
    }

    /// Finds the next initialized tick in the direction of travel: the greatest
    /// initialized tick `<= tick` when `lte`, otherwise the least initialized tick
    /// `> tick`. Returns `(tick, false)` at the `MIN_TICK`/`MAX_TICK` boundary when no
    /// such tick exists, since the caller always clamps the swap there anyway.
    fn next_initialized_tick(&self, tick: i32, lte: bool) -> (i32, bool) {
        if lte {
            if self.ticks.contains_key(&tick) {
                return (tick, true);
            }
            match self.ticks.range(..tick).next_back() {
                Some((&key, _)) => (key, true),
                None => (tick_math::MIN_TICK, false),
            }
        } else {
            match self.ticks.range((Bound::Excluded(tick), Bound::Unbounded)).next() {
                Some((&key, _)) => (key, true),
                None => (tick_math::MAX_TICK, false),
            }
        }
    }
}

/// Scratch state threaded through the per-tick loop of `swap`, mirroring the reference
/// implementation's `SwapState` dataclass.
struct SwapState {
    amount_specified_remaining: I256,
    amount_calculated: I256,
    sqrt_price_x96: U256,
    tick: i32,
    fee_growth_global_x128: U256,
    protocol_fee: u128,
    liquidity: u128,
}

fn liquidity_delta_from_amount(amount: u128) -> PoolResult<i128> {
    i128::try_from(amount).map_err(|_| PoolError::WidthOverflow("int128"))
}

fn fold_u256_low_128(value: U256) -> u128 {
    ((value.0[1] as u128) << 64) | value.0[0] as u128
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedger;

    fn addr(byte: u8) -> Address {
        let mut bytes = [0u8; 32];
        bytes[0] = byte;
        Address::new(bytes)
    }

    fn new_pool(fee: u32, tick_spacing: i32) -> Pool {
        Pool::new(addr(0), addr(1), addr(2), fee, tick_spacing)
    }

    fn fund(ledger: &mut InMemoryLedger, who: Address, token0: Address, token1: Address, amount: u128) {
        ledger.set_balance(who, token0, U256::from(amount));
        ledger.set_balance(who, token1, U256::from(amount));
    }

    #[test]
    fn initialize_sets_tick_and_price() {
        let mut pool = new_pool(3000, 60);
        let sqrt_price = U256::one() << 96; // price 1:1
        pool.initialize(sqrt_price).unwrap();
        assert_eq!(pool.slot0.tick, 0);
        assert_eq!(pool.slot0.sqrt_price_x96, sqrt_price);
    }

    #[test]
    fn initialize_twice_errors() {
        let mut pool = new_pool(3000, 60);
        pool.initialize(U256::one() << 96).unwrap();
        assert_eq!(
            pool.initialize(U256::one() << 96),
            Err(PoolError::AlreadyInitialized)
        );
    }

    #[test]
    fn mint_rejects_zero_amount() {
        let mut pool = new_pool(3000, 60);
        pool.initialize(U256::one() << 96).unwrap();
        let mut ledger = InMemoryLedger::new();
        assert_eq!(
            pool.mint(&mut ledger, addr(9), -60, 60, 0),
            Err(PoolError::MintAmountMustBePositive)
        );
    }

    #[test]
    fn mint_entirely_above_current_tick_takes_only_token0() {
        let mut pool = new_pool(3000, 60);
        pool.initialize(U256::one() << 96).unwrap(); // tick == 0
        let mut ledger = InMemoryLedger::new();
        let lp = addr(9);
        fund(&mut ledger, lp, pool.token0, pool.token1, 1_000_000_000);

        let (amount_0, amount_1) = pool.mint(&mut ledger, lp, 60, 120, 1_000_000).unwrap();

        assert!(!amount_0.is_zero());
        assert!(amount_1.is_zero());
        // liquidity is out of range, so the pool's active liquidity is untouched
        assert_eq!(pool.liquidity, 0);
        assert!(pool.ticks.get(&60).unwrap().is_initialized());
        assert!(pool.ticks.get(&120).unwrap().is_initialized());
    }

    #[test]
    fn mint_straddling_current_tick_takes_both_tokens_and_activates_liquidity() {
        let mut pool = new_pool(3000, 60);
        pool.initialize(U256::one() << 96).unwrap();
        let mut ledger = InMemoryLedger::new();
        let lp = addr(9);
        fund(&mut ledger, lp, pool.token0, pool.token1, 1_000_000_000);

        let (amount_0, amount_1) = pool.mint(&mut ledger, lp, -60, 60, 1_000_000).unwrap();

        assert!(!amount_0.is_zero());
        assert!(!amount_1.is_zero());
        assert_eq!(pool.liquidity, 1_000_000);
    }

    #[test]
    fn burn_requires_an_existing_position() {
        let mut pool = new_pool(3000, 60);
        pool.initialize(U256::one() << 96).unwrap();
        assert_eq!(
            pool.burn(addr(9), -60, 60, 1),
            Err(PoolError::PositionDoesNotExist)
        );
    }

    #[test]
    fn burn_full_liquidity_credits_tokens_owed_for_later_collect() {
        let mut pool = new_pool(3000, 60);
        pool.initialize(U256::one() << 96).unwrap();
        let mut ledger = InMemoryLedger::new();
        let lp = addr(9);
        fund(&mut ledger, lp, pool.token0, pool.token1, 1_000_000_000);
        pool.mint(&mut ledger, lp, -60, 60, 1_000_000).unwrap();

        let (amount_0, amount_1) = pool.burn(lp, -60, 60, 1_000_000).unwrap();
        assert!(!amount_0.is_zero());
        assert!(!amount_1.is_zero());
        assert_eq!(pool.liquidity, 0);

        let key = Pool::position_key(lp, -60, 60);
        let position = pool.positions.get(&key).unwrap();
        assert_eq!(U256::from(position.tokens_owed_0), amount_0);
        assert_eq!(U256::from(position.tokens_owed_1), amount_1);

        let (collected_0, collected_1) = pool
            .collect(&mut ledger, lp, -60, 60, u128::MAX, u128::MAX)
            .unwrap();
        assert_eq!(U256::from(collected_0), amount_0);
        assert_eq!(U256::from(collected_1), amount_1);
    }

    #[test]
    fn swap_rejects_a_price_limit_on_the_wrong_side_of_current_price() {
        let mut pool = new_pool(3000, 60);
        pool.initialize(U256::one() << 96).unwrap();
        let mut ledger = InMemoryLedger::new();
        assert_eq!(
            pool.swap(
                &mut ledger,
                addr(9),
                true,
                I256::from(1_000_i128),
                U256::one() << 96, // equal to current price, not strictly below
            ),
            Err(PoolError::SqrtPriceLimitOverflow)
        );
    }

    #[test]
    fn swap_rejects_zero_amount_specified() {
        let mut pool = new_pool(3000, 60);
        pool.initialize(U256::one() << 96).unwrap();
        let mut ledger = InMemoryLedger::new();
        assert_eq!(
            pool.swap(
                &mut ledger,
                addr(9),
                true,
                I256::ZERO,
                U256::from(tick_math::MIN_SQRT_RATIO) + U256::one(),
            ),
            Err(PoolError::InvalidSwapAmountSpecified)
        );
    }

    /// One-for-zero exact-input swap against full-range liquidity, stopped by a price
    /// limit before the input is exhausted — the same scenario exercised directly
    /// against `swap_math::compute_swap_step` in its own unit tests.
    #[test]
    fn full_range_swap_stopped_at_price_limit_matches_single_step_math() {
        let mut pool = new_pool(600, 1);
        let sqrt_p = U256::one() << 96; // encodeSqrt(1, 1)
        pool.initialize(sqrt_p).unwrap();

        let mut ledger = InMemoryLedger::new();
        let lp = addr(9);
        let huge = u128::MAX / 4;
        fund(&mut ledger, lp, pool.token0, pool.token1, huge);

        let liquidity = 2_000_000_000_000_000_000u128;
        pool.mint(&mut ledger, lp, tick_math::MIN_TICK, tick_math::MAX_TICK, liquidity)
            .unwrap();
        assert_eq!(pool.liquidity, liquidity);

        let price_target = {
            let numerator = U256::from(101u128) << 192;
            let ratio = numerator / U256::from(100u128);
            isqrt(ratio)
        };

        let trader = addr(10);
        fund(&mut ledger, trader, pool.token0, pool.token1, huge);

        let (amount_0, amount_1) = pool
            .swap(
                &mut ledger,
                trader,
                false,
                I256::from(1_000_000_000_000_000_000i128),
                price_target,
            )
            .unwrap();

        assert_eq!(pool.slot0.sqrt_price_x96, price_target);
        assert_eq!(amount_0, I256::from(-9_925_619_580_021_728i128));
        assert_eq!(amount_1, I256::from(9_981_112_891_913_203i128));
        assert!(!pool.fee_growth_global_1_x128.is_zero());
        assert!(pool.fee_growth_global_0_x128.is_zero());
    }

    #[test]
    fn protocol_fee_is_skimmed_from_the_swap_fee() {
        let mut pool = new_pool(600, 1);
        let sqrt_p = U256::one() << 96;
        pool.initialize(sqrt_p).unwrap();
        pool.set_fee_protocol(4, 4).unwrap();

        let mut ledger = InMemoryLedger::new();
        let lp = addr(9);
        let huge = u128::MAX / 4;
        fund(&mut ledger, lp, pool.token0, pool.token1, huge);
        pool.mint(
            &mut ledger,
            lp,
            tick_math::MIN_TICK,
            tick_math::MAX_TICK,
            2_000_000_000_000_000_000,
        )
        .unwrap();

        let trader = addr(10);
        fund(&mut ledger, trader, pool.token0, pool.token1, huge);
        let price_target = {
            let numerator = U256::from(101u128) << 192;
            let ratio = numerator / U256::from(100u128);
            isqrt(ratio)
        };
        pool.swap(
            &mut ledger,
            trader,
            false,
            I256::from(1_000_000_000_000_000_000i128),
            price_target,
        )
        .unwrap();

        assert!(pool.protocol_fees.token1 > 0);
        assert_eq!(pool.protocol_fees.token0, 0);
    }

    #[test]
    fn next_initialized_tick_falls_back_to_min_max_with_no_ticks() {
        let pool = new_pool(3000, 60);
        assert_eq!(pool.next_initialized_tick(0, true), (tick_math::MIN_TICK, false));
        assert_eq!(pool.next_initialized_tick(0, false), (tick_math::MAX_TICK, false));
    }

    #[test]
    fn next_initialized_tick_finds_the_nearest_boundary() {
        let mut pool = new_pool(3000, 60);
        pool.initialize(U256::one() << 96).unwrap();
        let mut ledger = InMemoryLedger::new();
        let lp = addr(9);
        fund(&mut ledger, lp, pool.token0, pool.token1, 1_000_000_000);
        pool.mint(&mut ledger, lp, -120, 120, 1_000_000).unwrap();

        assert_eq!(pool.next_initialized_tick(0, true), (-120, true));
        assert_eq!(pool.next_initialized_tick(0, false), (120, true));
        assert_eq!(pool.next_initialized_tick(-120, true), (-120, true));
    }

    fn isqrt(value: U256) -> U256 {
        if value.is_zero() {
            return U256::zero();
        }
        let mut x = value;
        let mut y = (x + U256::one()) / U256::from(2u8);
        while y < x {
            x = y;
            y = (x + value / x) / U256::from(2u8);
        }
        x
    }

    /// Minting entirely above the current tick, against a pool seeded at a 1:10 price —
    /// a single-sided, token0-only position.
    #[test]
    fn mint_above_current_tick_matches_reference_scenario() {
        let mut pool = new_pool(3000, 60);
        let sqrt_p = {
            let numerator = U256::from(1u128) << 192;
            isqrt(numerator / U256::from(10u128))
        };
        pool.initialize(sqrt_p).unwrap();
        assert_eq!(pool.slot0.tick, -23028);

        let mut ledger = InMemoryLedger::new();
        let lp = addr(9);
        let huge = u128::MAX / 4;
        fund(&mut ledger, lp, pool.token0, pool.token1, huge);

        let (amount_0, amount_1) = pool.mint(&mut ledger, lp, -887220, 887220, 3161).unwrap();
        assert_eq!(amount_0, U256::from(9996u32));
        assert_eq!(amount_1, U256::from(1000u32));

        let (amount_0, amount_1) = pool.mint(&mut ledger, lp, -22980, 0, 10000).unwrap();
        assert_eq!(amount_0, U256::from(21549u32));
        assert!(amount_1.is_zero());

        assert_eq!(
            ledger.balance_of(pool.address, pool.token0),
            U256::from(9996u32 + 21549u32)
        );
        assert_eq!(ledger.balance_of(pool.address, pool.token1), U256::from(1000u32));
    }

    /// A narrow-range limit-sell position that fills as the price crosses through it,
    /// exercising mint/swap/burn/collect together with the reference's literal amounts.
    #[test]
    fn limit_order_sell_zero_for_one_fills_and_is_collected() {
        let mut pool = new_pool(3000, 60);
        let sqrt_p = U256::one() << 96; // encodePriceSqrt(1, 1)
        pool.initialize(sqrt_p).unwrap();

        let mut ledger = InMemoryLedger::new();
        let lp = addr(9);
        let huge = u128::MAX / 4;
        fund(&mut ledger, lp, pool.token0, pool.token1, huge);

        pool.mint(
            &mut ledger,
            lp,
            -887220,
            887220,
            2_000_000_000_000_000_000,
        )
        .unwrap();

        let (amount_0, amount_1) = pool
            .mint(&mut ledger, lp, 0, 120, 1_000_000_000_000_000_000)
            .unwrap();
        assert_eq!(amount_0, U256::from(5_981_737_760_509_663u128));
        assert!(amount_1.is_zero());

        // swapExact1For0: token1 in, unconstrained by an explicit price limit.
        pool.swap(
            &mut ledger,
            lp,
            false,
            I256::from(2_000_000_000_000_000_000i128),
            tick_math::max_sqrt_ratio() - U256::one(),
        )
        .unwrap();

        let (amount_0, amount_1) = pool
            .burn(lp, 0, 120, 1_000_000_000_000_000_000)
            .unwrap();
        assert!(amount_0.is_zero());
        assert_eq!(amount_1, U256::from(6_017_734_268_818_165u128));

        let (collected_0, collected_1) = pool
            .collect(&mut ledger, lp, 0, 120, u128::MAX, u128::MAX)
            .unwrap();
        assert_eq!(collected_0, 0);
        assert_eq!(
            collected_1,
            6_017_734_268_818_165u128 + 18_107_525_382_602u128
        );

        assert!(pool.slot0.tick >= 120);
    }

    /// Protocol fee accrual is a direct percentage of each swap's input, split evenly
    /// across both swap directions.
    #[test]
    fn protocol_fee_split_matches_reference_scenario() {
        let mut pool = new_pool(3000, 60);
        let sqrt_p = U256::one() << 96; // encodePriceSqrt(1, 1)
        pool.initialize(sqrt_p).unwrap();
        pool.set_fee_protocol(6, 6).unwrap();

        let mut ledger = InMemoryLedger::new();
        let lp = addr(9);
        let huge = u128::MAX / 4;
        fund(&mut ledger, lp, pool.token0, pool.token1, huge);
        pool.mint(
            &mut ledger,
            lp,
            -887220,
            887220,
            1_000_000_000_000_000_000,
        )
        .unwrap();

        let trader = addr(10);
        fund(&mut ledger, trader, pool.token0, pool.token1, huge);

        // swapExact0For1(1e17)
        pool.swap(
            &mut ledger,
            trader,
            true,
            I256::from(100_000_000_000_000_000i128),
            U256::from(tick_math::MIN_SQRT_RATIO) + U256::one(),
        )
        .unwrap();

        // swapExact1For0(1e16)
        pool.swap(
            &mut ledger,
            trader,
            false,
            I256::from(10_000_000_000_000_000i128),
            tick_math::max_sqrt_ratio() - U256::one(),
        )
        .unwrap();

        assert_eq!(pool.protocol_fees.token0, 50_000_000_000_000);
        assert_eq!(pool.protocol_fees.token1, 5_000_000_000_000);
    }
}
