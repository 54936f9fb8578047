///! The token-balance bookkeeping boundary the pool settles value through at the end of
///! every mint/burn/collect/swap. The pool never touches a balance directly; it always
///! goes through this trait, so the engine can be driven by any account backend a host
///! supplies.
use std::collections::HashMap;

use crate::address::Address;
use crate::error::{PoolError, PoolResult};
use crate::libraries::big_num::U256;

/// A source of truth for token balances, kept entirely outside the pool's own state.
///
/// `transfer_token` must be atomic: either both balances move or neither does.
pub trait Ledger {
    fn balance_of(&self, owner: Address, token: Address) -> U256;

    /// Moves `amount` of `token` from `from` to `to`.
    ///
    /// Fails with `PoolError::InsufficientBalance` if `from` does not hold `amount`,
    /// leaving both balances untouched.
    fn transfer_token(
        &mut self,
        from: Address,
        to: Address,
        token: Address,
        amount: U256,
    ) -> PoolResult<()>;

    /// Credits `amount` of `token` to `to` from outside the ledger's tracked accounts
    /// (e.g. newly minted value). Used internally by `transfer_token`; exposed so a
    /// host can seed balances without a matching debit.
    fn receive_token(&mut self, to: Address, token: Address, amount: U256);
}

/// A minimal in-memory `Ledger`, mirroring the reference implementation's own
/// `Account`/`Ledger` test harness: every (owner, token) pair not yet touched reads as a
/// zero balance, and transfers are rejected outright rather than going negative.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLedger {
    balances: HashMap<(Address, Address), U256>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directly sets a balance, bypassing the transfer invariant. Intended for test
    /// setup (seeding an account before the pool ever calls into the ledger).
    pub fn set_balance(&mut self, owner: Address, token: Address, amount: U256) {
        self.balances.insert((owner, token), amount);
    }
}

impl Ledger for InMemoryLedger {
    fn balance_of(&self, owner: Address, token: Address) -> U256 {
        self.balances
            .get(&(owner, token))
            .copied()
            .unwrap_or_default()
    }

    fn transfer_token(
        &mut self,
        from: Address,
        to: Address,
        token: Address,
        amount: U256,
    ) -> PoolResult<()> {
        let balance_sender_before = self.balance_of(from, token);
        if balance_sender_before < amount {
            return Err(PoolError::InsufficientBalance);
        }
        let balance_receiver_before = self.balance_of(to, token);

        self.balances
            .insert((from, token), balance_sender_before - amount);
        self.receive_token(to, token, amount);

        debug_assert_eq!(self.balance_of(from, token), balance_sender_before - amount);
        debug_assert_eq!(
            self.balance_of(to, token),
            balance_receiver_before + amount
        );
        Ok(())
    }

    fn receive_token(&mut self, to: Address, token: Address, amount: U256) {
        let balance = self.balance_of(to, token);
        self.balances.insert((to, token), balance + amount);
    }
}
