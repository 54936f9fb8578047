use thiserror::Error;

/// Errors raised by the pool engine.
///
/// Every public operation that can fail returns one of these; propagation
/// leaves pool state exactly as it was at entry (no partial commits).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    #[error("AI: pool already initialized")]
    AlreadyInitialized,

    #[error("TLU: tick lower must be less than tick upper")]
    TickLowerGteUpper,
    #[error("TLM: tick lower must be greater than, or equal to, the minimum tick")]
    TickLowerOverflow,
    #[error("TUM: tick upper must be lesser than, or equal to, the maximum tick")]
    TickUpperOverflow,
    #[error("tick % tick_spacing must be zero")]
    TickAndSpacingNotMatch,

    #[error("R: sqrt_price_x96 out of range")]
    SqrtPriceOutOfRange,
    #[error("T: tick out of range")]
    TickOutOfRange,

    #[error("LO: liquidity gross would exceed the per-tick cap")]
    LiquidityOverflowAtTick,
    #[error("LS: liquidity subtraction would underflow")]
    LiquiditySubValueErr,
    #[error("LA: liquidity addition would overflow")]
    LiquidityAddValueErr,

    #[error("mint amount must be greater than zero")]
    MintAmountMustBePositive,

    #[error("AS: amount_specified must not be zero")]
    InvalidSwapAmountSpecified,
    #[error("SPL: sqrt_price_limit is outside the valid range for the swap direction")]
    SqrtPriceLimitOverflow,
    #[error("IIA: ledger balance invariant violated after a transfer")]
    InsufficientInputAmount,

    #[error("fee_protocol must be 0 or in [4, 10]")]
    InvalidFeeProtocol,

    #[error("position doesn't exist")]
    PositionDoesNotExist,
    #[error("pool already exists")]
    PoolAlreadyExists,
    #[error("fee amount not supported")]
    FeeAmountNotSupported,
    #[error("tick spacing already registered for this fee amount")]
    FeeAmountAlreadyEnabled,
    #[error("invalid fee amount or tick spacing for enable_fee_amount")]
    InvalidFeeAmount,
    #[error("token_a and token_b must not be the same token")]
    IdenticalTokens,

    #[error("insufficient balance")]
    InsufficientBalance,

    #[error("OF or UF of {0}")]
    WidthOverflow(&'static str),
}

pub type PoolResult<T> = Result<T, PoolError>;
