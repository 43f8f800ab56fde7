//! Unit constants and conversions for amounts and gas prices.

/// Wei per ether
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// Wei per gwei
pub const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Whole ether to wei
pub const fn ether_to_wei(ether: u128) -> u128 {
    ether * WEI_PER_ETHER
}

/// Wei to whole ether, truncating
pub const fn wei_to_ether(wei: u128) -> u128 {
    wei / WEI_PER_ETHER
}

/// Gwei to wei
pub const fn gwei_to_wei(gwei: u64) -> u128 {
    gwei as u128 * WEI_PER_GWEI
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(ether_to_wei(3), 3_000_000_000_000_000_000);
        assert_eq!(wei_to_ether(ether_to_wei(7) + 123), 7);
        assert_eq!(gwei_to_wei(50), 50_000_000_000);
    }
}
