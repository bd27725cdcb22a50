use serde::{Deserialize, Serialize};
use tessera_core::{Address, AliasId};

/// Bytes every output occupies in the ledger's key space: output id (34),
/// block id (32), milestone index (4) and milestone timestamp (4).
const KEY_OFFSET_BYTES: u64 = 34 + 32 + 4 + 4;

/// Bytes of a serialized address (kind byte + hash).
const ADDRESS_BYTES: u64 = 1 + 32;

/// Parameters for the storage deposit every output must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentStructure {
    /// Token cost per virtual byte.
    pub v_byte_cost: u32,
    /// Weight of key bytes.
    pub v_byte_factor_key: u8,
    /// Weight of data bytes.
    pub v_byte_factor_data: u8,
}

impl Default for RentStructure {
    fn default() -> Self {
        Self {
            v_byte_cost: 100,
            v_byte_factor_key: 10,
            v_byte_factor_data: 1,
        }
    }
}

/// Network-wide parameters every node agrees on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParameters {
    pub network_hrp: String,
    pub rent_structure: RentStructure,
    /// Tokens minted per faucet request.
    pub faucet_amount: u64,
}

impl Default for ProtocolParameters {
    fn default() -> Self {
        Self {
            network_hrp: tessera_core::DEFAULT_NETWORK_HRP.to_string(),
            rent_structure: RentStructure::default(),
            faucet_amount: 10_000_000,
        }
    }
}

/// After `unix_time` the output can only be unlocked by `return_address`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expiration {
    pub return_address: Address,
    pub unix_time: u32,
}

/// Consuming the output requires paying `amount` back to `return_address`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageDepositReturn {
    pub return_address: Address,
    pub amount: u64,
}

/// Token-carrying output owned by an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicOutput {
    pub amount: u64,
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<Expiration>,
    /// Unix time before which the output cannot be consumed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timelock: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_deposit_return: Option<StorageDepositReturn>,
}

impl BasicOutput {
    /// A plain output with no additional unlock conditions.
    pub fn new(amount: u64, address: Address) -> Self {
        Self {
            amount,
            address,
            expiration: None,
            timelock: None,
            storage_deposit_return: None,
        }
    }

    pub fn has_conditions(&self) -> bool {
        self.expiration.is_some() || self.timelock.is_some() || self.storage_deposit_return.is_some()
    }

    /// The address allowed to unlock this output at `now`.
    pub fn unlock_address(&self, now: u32) -> &Address {
        match &self.expiration {
            Some(exp) if now >= exp.unix_time => &exp.return_address,
            _ => &self.address,
        }
    }
}

/// Stateful output whose metadata holds a packed DID document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasOutput {
    pub amount: u64,
    /// Null until the ledger assigns an id on creation.
    pub alias_id: AliasId,
    pub state_index: u32,
    #[serde(with = "hex_bytes")]
    pub state_metadata: Vec<u8>,
    pub state_controller: Address,
    pub governor: Address,
}

impl AliasOutput {
    /// A new alias controlled and governed by one address.
    pub fn new(amount: u64, controller: Address, state_metadata: Vec<u8>) -> Self {
        Self {
            amount,
            alias_id: AliasId::NULL,
            state_index: 0,
            state_metadata,
            state_controller: controller.clone(),
            governor: controller,
        }
    }
}

/// A ledger output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Output {
    Basic(BasicOutput),
    Alias(AliasOutput),
}

impl Output {
    pub fn amount(&self) -> u64 {
        match self {
            Self::Basic(o) => o.amount,
            Self::Alias(o) => o.amount,
        }
    }

    /// Addresses this output references; all must be on the ledger's network.
    pub fn addresses(&self) -> Vec<&Address> {
        match self {
            Self::Basic(o) => {
                let mut out = vec![&o.address];
                if let Some(exp) = &o.expiration {
                    out.push(&exp.return_address);
                }
                if let Some(sdr) = &o.storage_deposit_return {
                    out.push(&sdr.return_address);
                }
                out
            }
            Self::Alias(o) => vec![&o.state_controller, &o.governor],
        }
    }

    /// Serialized size of the output's data, used for rent.
    pub fn data_bytes(&self) -> u64 {
        match self {
            Self::Basic(o) => {
                let mut n = 1 + 8 + ADDRESS_BYTES + 1;
                if o.expiration.is_some() {
                    n += 1 + ADDRESS_BYTES + 4;
                }
                if o.timelock.is_some() {
                    n += 1 + 4;
                }
                if o.storage_deposit_return.is_some() {
                    n += 1 + ADDRESS_BYTES + 8;
                }
                n
            }
            Self::Alias(o) => {
                1 + 8 + 32 + 4 + 2 + o.state_metadata.len() as u64 + 2 * (1 + ADDRESS_BYTES) + 1
            }
        }
    }

    pub fn as_basic(&self) -> Option<&BasicOutput> {
        match self {
            Self::Basic(o) => Some(o),
            Self::Alias(_) => None,
        }
    }

    pub fn as_alias(&self) -> Option<&AliasOutput> {
        match self {
            Self::Alias(o) => Some(o),
            Self::Basic(_) => None,
        }
    }
}

/// Minimum amount an output must hold under a rent structure.
pub fn compute_storage_deposit(output: &Output, rent: &RentStructure) -> u64 {
    let weighted = output.data_bytes() * rent.v_byte_factor_data as u64
        + KEY_OFFSET_BYTES * rent.v_byte_factor_key as u64;
    weighted * rent.v_byte_cost as u64
}

/// Query over unspent basic outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_expiration: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_timelock: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_storage_deposit_return: Option<bool>,
}

impl OutputFilter {
    /// Outputs an address can spend right away with a plain signature.
    pub fn spendable_by(address: &Address) -> Self {
        Self {
            address: Some(address.clone()),
            has_expiration: Some(false),
            has_timelock: Some(false),
            has_storage_deposit_return: Some(false),
        }
    }

    pub fn matches(&self, output: &BasicOutput) -> bool {
        fn flag(want: Option<bool>, has: bool) -> bool {
            want.map(|w| w == has).unwrap_or(true)
        }
        self.address.as_ref().map(|a| a == &output.address).unwrap_or(true)
            && flag(self.has_expiration, output.expiration.is_some())
            && flag(self.has_timelock, output.timelock.is_some())
            && flag(self.has_storage_deposit_return, output.storage_deposit_return.is_some())
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        let digits = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(digits).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(byte: u8) -> Address {
        Address::new("tst", [byte; 32]).unwrap()
    }

    #[test]
    fn test_basic_storage_deposit() {
        let output = Output::Basic(BasicOutput::new(0, address(1)));
        let rent = RentStructure::default();
        // (43 data bytes * 1 + 74 key bytes * 10) * 100
        assert_eq!(compute_storage_deposit(&output, &rent), 78_300);
    }

    #[test]
    fn test_alias_deposit_grows_with_metadata() {
        let rent = RentStructure::default();
        let small = Output::Alias(AliasOutput::new(0, address(1), vec![0u8; 10]));
        let large = Output::Alias(AliasOutput::new(0, address(1), vec![0u8; 1000]));
        let diff = compute_storage_deposit(&large, &rent) - compute_storage_deposit(&small, &rent);
        assert_eq!(diff, 990 * 100);
    }

    #[test]
    fn test_conditions_increase_deposit() {
        let rent = RentStructure::default();
        let plain = Output::Basic(BasicOutput::new(0, address(1)));
        let mut locked = BasicOutput::new(0, address(1));
        locked.timelock = Some(100);
        assert!(
            compute_storage_deposit(&Output::Basic(locked), &rent)
                > compute_storage_deposit(&plain, &rent)
        );
    }

    #[test]
    fn test_unlock_address_after_expiration() {
        let mut output = BasicOutput::new(1, address(1));
        output.expiration = Some(Expiration {
            return_address: address(2),
            unix_time: 1000,
        });
        assert_eq!(output.unlock_address(999), &address(1));
        assert_eq!(output.unlock_address(1000), &address(2));
    }

    #[test]
    fn test_filter_matches() {
        let plain = BasicOutput::new(5, address(1));
        let mut locked = BasicOutput::new(5, address(1));
        locked.timelock = Some(10);

        let filter = OutputFilter::spendable_by(&address(1));
        assert!(filter.matches(&plain));
        assert!(!filter.matches(&locked));
        assert!(!OutputFilter::spendable_by(&address(2)).matches(&plain));
        assert!(OutputFilter::default().matches(&locked));
    }

    #[test]
    fn test_output_json_tagged() {
        let output = Output::Alias(AliasOutput::new(7, address(1), vec![0xde, 0xad]));
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["type"], "alias");
        assert_eq!(json["state_metadata"], "0xdead");
        let back: Output = serde_json::from_value(json).unwrap();
        assert_eq!(back, output);
    }
}
