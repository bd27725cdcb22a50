/// DID method name used by every Tessera identity.
pub const DID_METHOD: &str = "tessera";

/// Human-readable part of addresses and DIDs on the default test network.
pub const DEFAULT_NETWORK_HRP: &str = "tst";

/// SLIP-44 coin type of Shimmer, used as the default key derivation branch.
pub const COIN_TYPE_SHIMMER: u32 = 4219;

/// SLIP-44 coin type of IOTA.
pub const COIN_TYPE_IOTA: u32 = 4218;

/// Maximum length of a network name.
pub const MAX_NETWORK_HRP_LEN: usize = 6;

/// Checks that a network name is 1..=6 lowercase ASCII letters.
pub fn is_valid_network_hrp(hrp: &str) -> bool {
    !hrp.is_empty()
        && hrp.len() <= MAX_NETWORK_HRP_LEN
        && hrp.chars().all(|c| c.is_ascii_lowercase())
}
