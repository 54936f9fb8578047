//! A concentrated-liquidity constant-function market maker pool engine.
//!
//! Modeled on the Uniswap V3 core contracts: liquidity is provided over discrete
//! `[tick_lower, tick_upper)` ranges rather than across the full price curve, and a
//! pool tracks its own tick table, position table, and fee-growth accumulators. The
//! pool never owns token balances itself — every mint, burn, collect, and swap settles
//! value through a caller-supplied [`ledger::Ledger`].
//!
//! `factory` deploys pools against a registry of allowed `(fee, tick_spacing)` tiers;
//! `state::pool::Pool` is the orchestrator; `libraries` holds the fixed-point and
//! tick/price math the pool is built from.

pub mod address;
pub mod error;
pub mod factory;
pub mod ledger;
pub mod libraries;
pub mod state;

pub use address::{Address, PositionKey};
pub use error::{PoolError, PoolResult};
pub use factory::{FeeConfig, Factory};
pub use ledger::{InMemoryLedger, Ledger};
pub use state::pool::Pool;
