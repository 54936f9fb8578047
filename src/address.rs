///! A chain-agnostic stand-in for an account/token identifier.
use std::fmt;

/// A fixed-size identifier for a token mint or an account, used wherever the reference
/// protocol passes around a `Pubkey`/address. 32 bytes accommodates either a Solana
/// public key or a zero-padded EVM address without picking a specific chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }
}

/// Key identifying a position by its owner and tick range. Stable and hashable, used as
/// the key of `Pool::positions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PositionKey {
    pub owner: Address,
    pub tick_lower: i32,
    pub tick_upper: i32,
}

impl PositionKey {
    pub fn new(owner: Address, tick_lower: i32, tick_upper: i32) -> Self {
        PositionKey {
            owner,
            tick_lower,
            tick_upper,
        }
    }
}
