use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{is_valid_network_hrp, DID_METHOD};
use crate::error::CoreError;

fn decode_prefixed_hex<const N: usize>(s: &str) -> Result<[u8; N], CoreError> {
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| CoreError::InvalidIdentifier(format!("missing 0x prefix: {}", s)))?;
    let bytes = hex::decode(digits)
        .map_err(|e| CoreError::InvalidIdentifier(format!("invalid hex in {}: {}", s, e)))?;
    bytes.try_into().map_err(|v: Vec<u8>| {
        CoreError::InvalidIdentifier(format!("expected {} bytes, got {}", N, v.len()))
    })
}

/// Identifier of an alias output, assigned by the ledger when the alias is
/// first created. The all-zero id marks an alias that does not exist yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AliasId([u8; 32]);

impl AliasId {
    /// The placeholder id of an alias output that has not been published.
    pub const NULL: AliasId = AliasId([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive the id of a new alias from the output that created it.
    pub fn from_output_id(output_id: &OutputId) -> Self {
        Self(*blake3::hash(&output_id.to_bytes()).as_bytes())
    }

    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for AliasId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for AliasId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_prefixed_hex::<32>(s).map(Self)
    }
}

impl TryFrom<String> for AliasId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AliasId> for String {
    fn from(id: AliasId) -> Self {
        id.to_string()
    }
}

/// Hash of a transaction accepted by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionId([u8; 32]);

impl TransactionId {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for TransactionId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_prefixed_hex::<32>(s).map(Self)
    }
}

impl TryFrom<String> for TransactionId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TransactionId> for String {
    fn from(id: TransactionId) -> Self {
        id.to_string()
    }
}

/// Reference to an output: the transaction that created it plus its index.
///
/// Rendered as `0x<64 hex transaction id><4 hex little-endian index>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OutputId {
    transaction_id: TransactionId,
    index: u16,
}

impl OutputId {
    pub fn new(transaction_id: TransactionId, index: u16) -> Self {
        Self {
            transaction_id,
            index,
        }
    }

    pub fn transaction_id(&self) -> &TransactionId {
        &self.transaction_id
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    /// The 34-byte binary form.
    pub fn to_bytes(&self) -> [u8; 34] {
        let mut out = [0u8; 34];
        out[..32].copy_from_slice(self.transaction_id.as_bytes());
        out[32..].copy_from_slice(&self.index.to_le_bytes());
        out
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.to_bytes()))
    }
}

impl FromStr for OutputId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_prefixed_hex::<34>(s)?;
        let mut tx = [0u8; 32];
        tx.copy_from_slice(&bytes[..32]);
        let index = u16::from_le_bytes([bytes[32], bytes[33]]);
        Ok(Self::new(TransactionId::new(tx), index))
    }
}

impl TryFrom<String> for OutputId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OutputId> for String {
    fn from(id: OutputId) -> Self {
        id.to_string()
    }
}

/// Ed25519 ledger address: the BLAKE3 hash of a public key, bound to a network.
///
/// Rendered as `<hrp>1<64 hex>`. Network names never contain digits, so the
/// first `1` always separates the two parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    hrp: String,
    key_hash: [u8; 32],
}

impl Address {
    pub fn new(hrp: &str, key_hash: [u8; 32]) -> Result<Self, CoreError> {
        if !is_valid_network_hrp(hrp) {
            return Err(CoreError::InvalidNetwork(hrp.to_string()));
        }
        Ok(Self {
            hrp: hrp.to_string(),
            key_hash,
        })
    }

    /// Derive the address controlled by an Ed25519 public key.
    pub fn from_public_key_bytes(hrp: &str, public_key: &[u8; 32]) -> Result<Self, CoreError> {
        Self::new(hrp, *blake3::hash(public_key).as_bytes())
    }

    /// Parse a rendered address.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let (hrp, digits) = s
            .split_once('1')
            .ok_or_else(|| CoreError::InvalidAddress(format!("missing separator: {}", s)))?;
        let bytes = hex::decode(digits)
            .map_err(|e| CoreError::InvalidAddress(format!("invalid hex in {}: {}", s, e)))?;
        let key_hash: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CoreError::InvalidAddress(format!("wrong hash length: {}", s)))?;
        Self::new(hrp, key_hash)
            .map_err(|_| CoreError::InvalidAddress(format!("invalid network in {}", s)))
    }

    pub fn hrp(&self) -> &str {
        &self.hrp
    }

    pub fn key_hash(&self) -> &[u8; 32] {
        &self.key_hash
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}1{}", self.hrp, hex::encode(self.key_hash))
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

/// Decentralized Identifier anchored in an alias output.
/// Format: `did:tessera:<hrp>:0x<64 hex alias id>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did {
    network: String,
    alias_id: AliasId,
}

impl Did {
    /// Parse a DID from its full URI string.
    pub fn new(uri: &str) -> Result<Self, CoreError> {
        let prefix = format!("did:{}:", DID_METHOD);
        let rest = uri.strip_prefix(&prefix).ok_or_else(|| {
            CoreError::InvalidDid(format!("DID must start with '{}', got: {}", prefix, uri))
        })?;
        let (network, id) = rest.split_once(':').ok_or_else(|| {
            CoreError::InvalidDid(format!(
                "DID must have format 'did:{}:<network>:<alias id>', got: {}",
                DID_METHOD, uri
            ))
        })?;
        if !is_valid_network_hrp(network) {
            return Err(CoreError::InvalidDid(format!(
                "invalid network '{}' in {}",
                network, uri
            )));
        }
        let alias_id = id
            .parse::<AliasId>()
            .map_err(|e| CoreError::InvalidDid(format!("{}: {}", uri, e)))?;
        Ok(Self {
            network: network.to_string(),
            alias_id,
        })
    }

    /// Build the DID of an alias on the given network.
    pub fn from_alias_id(network: &str, alias_id: AliasId) -> Result<Self, CoreError> {
        if !is_valid_network_hrp(network) {
            return Err(CoreError::InvalidNetwork(network.to_string()));
        }
        Ok(Self {
            network: network.to_string(),
            alias_id,
        })
    }

    /// The DID of a document that has not been published yet.
    pub fn placeholder(network: &str) -> Result<Self, CoreError> {
        Self::from_alias_id(network, AliasId::NULL)
    }

    pub fn is_placeholder(&self) -> bool {
        self.alias_id.is_null()
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn alias_id(&self) -> AliasId {
        self.alias_id
    }

    /// Append a fragment, producing a DID URL (`<did>#<fragment>`).
    pub fn join(&self, fragment: &str) -> Result<DidUrl, CoreError> {
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        DidUrl::new(self.clone(), Some(fragment.to_string()))
    }

    /// The DID as a URL without a fragment.
    pub fn to_url(&self) -> DidUrl {
        DidUrl {
            did: self.clone(),
            fragment: None,
        }
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "did:{}:{}:{}", DID_METHOD, self.network, self.alias_id)
    }
}

impl FromStr for Did {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Did {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.to_string()
    }
}

/// A DID with an optional `#fragment` naming a method or service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DidUrl {
    did: Did,
    fragment: Option<String>,
}

impl DidUrl {
    pub fn new(did: Did, fragment: Option<String>) -> Result<Self, CoreError> {
        if let Some(f) = &fragment {
            if f.is_empty() || f.contains('#') || f.contains(char::is_whitespace) {
                return Err(CoreError::InvalidDidUrl(format!("invalid fragment '{}'", f)));
            }
        }
        Ok(Self { did, fragment })
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s.split_once('#') {
            Some((did, fragment)) => Self::new(Did::new(did)?, Some(fragment.to_string())),
            None => Ok(Self {
                did: Did::new(s)?,
                fragment: None,
            }),
        }
    }

    pub fn did(&self) -> &Did {
        &self.did
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    pub fn set_fragment(&mut self, fragment: &str) -> Result<(), CoreError> {
        let updated = Self::new(self.did.clone(), Some(fragment.to_string()))?;
        *self = updated;
        Ok(())
    }

    /// Rebind this URL to another DID, keeping the fragment.
    pub fn with_did(&self, did: Did) -> Self {
        Self {
            did,
            fragment: self.fragment.clone(),
        }
    }
}

impl fmt::Display for DidUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.fragment {
            Some(fragment) => write!(f, "{}#{}", self.did, fragment),
            None => write!(f, "{}", self.did),
        }
    }
}

impl FromStr for DidUrl {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DidUrl {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DidUrl> for String {
    fn from(url: DidUrl) -> Self {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alias(byte: u8) -> AliasId {
        AliasId::new([byte; 32])
    }

    #[test]
    fn test_did_display_and_parse() {
        let did = Did::from_alias_id("tst", alias(0xab)).unwrap();
        let uri = did.to_string();
        assert!(uri.starts_with("did:tessera:tst:0x"));
        assert_eq!(uri.len(), "did:tessera:tst:0x".len() + 64);
        let parsed = Did::new(&uri).unwrap();
        assert_eq!(parsed, did);
        assert_eq!(parsed.network(), "tst");
        assert_eq!(parsed.alias_id(), alias(0xab));
    }

    #[test]
    fn test_did_wrong_method() {
        let result = Did::new("did:iota:tst:0x00");
        assert!(matches!(result, Err(CoreError::InvalidDid(_))));
    }

    #[test]
    fn test_did_missing_alias() {
        assert!(Did::new("did:tessera:tst").is_err());
    }

    #[test]
    fn test_did_bad_network() {
        let uri = format!("did:tessera:TST:{}", alias(1));
        assert!(Did::new(&uri).is_err());
    }

    #[test]
    fn test_did_short_alias_id() {
        assert!(Did::new("did:tessera:tst:0xabcd").is_err());
    }

    #[test]
    fn test_placeholder() {
        let did = Did::placeholder("tst").unwrap();
        assert!(did.is_placeholder());
        let real = Did::from_alias_id("tst", alias(7)).unwrap();
        assert!(!real.is_placeholder());
    }

    #[test]
    fn test_join_fragment() {
        let did = Did::from_alias_id("tst", alias(3)).unwrap();
        let url = did.join("#revoke").unwrap();
        assert_eq!(url.fragment(), Some("revoke"));
        assert_eq!(url.to_string(), format!("{}#revoke", did));

        let same = did.join("revoke").unwrap();
        assert_eq!(url, same);
    }

    #[test]
    fn test_did_url_parse() {
        let did = Did::from_alias_id("tst", alias(9)).unwrap();
        let url = DidUrl::parse(&format!("{}#verify", did)).unwrap();
        assert_eq!(url.did(), &did);
        assert_eq!(url.fragment(), Some("verify"));

        let bare = DidUrl::parse(&did.to_string()).unwrap();
        assert_eq!(bare.fragment(), None);
    }

    #[test]
    fn test_did_url_set_fragment() {
        let did = Did::from_alias_id("tst", alias(9)).unwrap();
        let mut url = did.to_url();
        url.set_fragment("revoke").unwrap();
        assert_eq!(url.fragment(), Some("revoke"));
        assert!(url.set_fragment("").is_err());
    }

    #[test]
    fn test_did_serde_as_string() {
        let did = Did::from_alias_id("tst", alias(5)).unwrap();
        let json = serde_json::to_string(&did).unwrap();
        assert_eq!(json, format!("\"{}\"", did));
        let back: Did = serde_json::from_str(&json).unwrap();
        assert_eq!(back, did);
    }

    #[test]
    fn test_output_id_roundtrip() {
        let id = OutputId::new(TransactionId::new([0x11; 32]), 3);
        let s = id.to_string();
        assert_eq!(s.len(), 2 + 68);
        assert!(s.ends_with("0300"));
        let back: OutputId = s.parse().unwrap();
        assert_eq!(back, id);
        assert_eq!(back.index(), 3);
    }

    #[test]
    fn test_alias_id_from_output_id_deterministic() {
        let id = OutputId::new(TransactionId::new([0x22; 32]), 0);
        assert_eq!(AliasId::from_output_id(&id), AliasId::from_output_id(&id));
        let other = OutputId::new(TransactionId::new([0x22; 32]), 1);
        assert_ne!(AliasId::from_output_id(&id), AliasId::from_output_id(&other));
        assert!(!AliasId::from_output_id(&id).is_null());
    }

    #[test]
    fn test_address_roundtrip() {
        let address = Address::from_public_key_bytes("tst", &[7u8; 32]).unwrap();
        let s = address.to_string();
        assert!(s.starts_with("tst1"));
        let back = Address::parse(&s).unwrap();
        assert_eq!(back, address);
        assert_eq!(back.hrp(), "tst");
    }

    #[test]
    fn test_address_invalid() {
        assert!(Address::parse("tst").is_err());
        assert!(Address::parse("tst1zz").is_err());
        assert!(Address::parse("tst1abcd").is_err());
        assert!(Address::from_public_key_bytes("T5T", &[0u8; 32]).is_err());
    }

    #[test]
    fn test_addresses_differ_per_network() {
        let a = Address::from_public_key_bytes("tst", &[1u8; 32]).unwrap();
        let b = Address::from_public_key_bytes("smr", &[1u8; 32]).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.key_hash(), b.key_hash());
    }
}
