use super::{big_num::U128, U256};

pub trait UnsafeMathTrait {
    /// Returns ceil (x / y)
    /// Division by 0 throws a panic, and must be checked externally
    fn div_rounding_up(x: Self, y: Self) -> Self;
}

impl UnsafeMathTrait for U128 {
    fn div_rounding_up(x: Self, y: Self) -> Self {
        x / y + U128::from((x % y > U128::default()) as u8)
    }
}

impl UnsafeMathTrait for U256 {
    fn div_rounding_up(x: Self, y: Self) -> Self {
        x / y + U256::from((x % y > U256::default()) as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divide_by_factor() {
        assert_eq!(
            U256::div_rounding_up(U256::from(4u8), U256::from(2u8)),
            U256::from(2u8)
        );
    }

    #[test]
    fn divide_and_round_up() {
        assert_eq!(
            U256::div_rounding_up(U256::from(4u8), U256::from(3u8)),
            U256::from(2u8)
        );
    }

    #[test]
    #[should_panic]
    fn divide_by_zero() {
        U256::div_rounding_up(U256::from(2u8), U256::zero());
    }
}
