///! 128, 256 and 512 bit unsigned integers
///! U256 backs sqrtPriceX96 (uint160) and the Q128.128 intermediates in tick math;
///! U512 is the scratch width `MulDiv` needs to multiply two U256 values before dividing.
use uint::construct_uint;

construct_uint! {
    pub struct U128(2);
}

construct_uint! {
    pub struct U256(4);
}

construct_uint! {
    pub struct U512(8);
}

/// Modulo-2^256 addition and subtraction for the fee-growth accumulators, which wrap
/// around by design (spec §9) rather than panicking like the `uint` crate's own
/// operators do on over/underflow.
pub trait WrappingOps256 {
    fn wrapping_add_256(self, rhs: Self) -> Self;
    fn wrapping_sub_256(self, rhs: Self) -> Self;
}

impl WrappingOps256 for U256 {
    fn wrapping_add_256(self, rhs: Self) -> Self {
        self.overflowing_add(rhs).0
    }

    fn wrapping_sub_256(self, rhs: Self) -> Self {
        if self >= rhs {
            self - rhs
        } else {
            (U256::MAX - rhs) + self + U256::one()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapping_sub_wraps_on_underflow() {
        assert_eq!(U256::zero().wrapping_sub_256(U256::one()), U256::MAX);
    }

    #[test]
    fn wrapping_add_wraps_on_overflow() {
        assert_eq!(U256::MAX.wrapping_add_256(U256::one()), U256::zero());
    }
}
