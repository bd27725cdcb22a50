//! Credential revocation lists published as DID document services.
//!
//! The service endpoint is a `data:` URL holding the revoked indices,
//! sorted and delta-encoded as LEB128 varints, then base64url encoded.

use std::collections::BTreeSet;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use tessera_core::DidUrl;

use crate::document::Service;
use crate::error::IdentityError;

const DATA_URL_PREFIX: &str = "data:application/octet-stream;base64,";

/// Set of revoked credential indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevocationBitmap {
    revoked: BTreeSet<u32>,
}

impl RevocationBitmap {
    /// Service type of revocation bitmaps.
    pub const TYPE: &'static str = "RevocationBitmap2022";

    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an index as revoked. Returns false if it already was.
    pub fn revoke(&mut self, index: u32) -> bool {
        self.revoked.insert(index)
    }

    /// Clear a revocation. Returns false if the index was not revoked.
    pub fn unrevoke(&mut self, index: u32) -> bool {
        self.revoked.remove(&index)
    }

    pub fn is_revoked(&self, index: u32) -> bool {
        self.revoked.contains(&index)
    }

    /// Number of revoked indices.
    pub fn len(&self) -> usize {
        self.revoked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revoked.is_empty()
    }

    pub fn to_endpoint(&self) -> String {
        let mut bytes = Vec::with_capacity(self.revoked.len() * 2);
        let mut previous = 0u32;
        for &index in &self.revoked {
            write_varint(&mut bytes, index - previous);
            previous = index;
        }
        format!("{}{}", DATA_URL_PREFIX, URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn from_endpoint(endpoint: &str) -> Result<Self, IdentityError> {
        let encoded = endpoint.strip_prefix(DATA_URL_PREFIX).ok_or_else(|| {
            IdentityError::Revocation(format!("unsupported endpoint: {}", endpoint))
        })?;
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| IdentityError::Revocation(format!("invalid base64: {}", e)))?;

        let mut revoked = BTreeSet::new();
        let mut cursor = bytes.as_slice();
        let mut previous = 0u32;
        while !cursor.is_empty() {
            let delta = read_varint(&mut cursor)?;
            let index = previous
                .checked_add(delta)
                .ok_or_else(|| IdentityError::Revocation("index overflow".into()))?;
            if !revoked.is_empty() && delta == 0 {
                return Err(IdentityError::Revocation("duplicate index".into()));
            }
            revoked.insert(index);
            previous = index;
        }
        Ok(Self { revoked })
    }

    /// Wrap the bitmap in a service with the given id.
    pub fn to_service(&self, id: DidUrl) -> Service {
        Service {
            id,
            service_type: Self::TYPE.to_string(),
            service_endpoint: self.to_endpoint(),
        }
    }
}

impl TryFrom<&Service> for RevocationBitmap {
    type Error = IdentityError;

    fn try_from(service: &Service) -> Result<Self, Self::Error> {
        if service.service_type != Self::TYPE {
            return Err(IdentityError::InvalidService(format!(
                "expected type {}, got {}",
                Self::TYPE,
                service.service_type
            )));
        }
        Self::from_endpoint(&service.service_endpoint)
    }
}

fn write_varint(out: &mut Vec<u8>, mut value: u32) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

fn read_varint(cursor: &mut &[u8]) -> Result<u32, IdentityError> {
    let mut value: u32 = 0;
    for shift in (0..35).step_by(7) {
        let (&byte, rest) = cursor
            .split_first()
            .ok_or_else(|| IdentityError::Revocation("truncated varint".into()))?;
        *cursor = rest;
        let bits = (byte & 0x7f) as u32;
        if shift == 28 && bits > 0x0f {
            return Err(IdentityError::Revocation("varint overflow".into()));
        }
        value |= bits << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(IdentityError::Revocation("varint too long".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::Did;

    #[test]
    fn test_revoke_unrevoke() {
        let mut bitmap = RevocationBitmap::new();
        assert!(bitmap.revoke(5));
        assert!(!bitmap.revoke(5));
        assert!(bitmap.is_revoked(5));
        assert!(!bitmap.is_revoked(4));
        assert!(bitmap.unrevoke(5));
        assert!(!bitmap.unrevoke(5));
        assert!(bitmap.is_empty());
    }

    #[test]
    fn test_endpoint_roundtrip() {
        let mut bitmap = RevocationBitmap::new();
        for index in [0, 1, 127, 128, 300, 70_000, u32::MAX] {
            bitmap.revoke(index);
        }
        let endpoint = bitmap.to_endpoint();
        assert!(endpoint.starts_with(DATA_URL_PREFIX));
        assert_eq!(RevocationBitmap::from_endpoint(&endpoint).unwrap(), bitmap);
    }

    #[test]
    fn test_empty_endpoint() {
        let endpoint = RevocationBitmap::new().to_endpoint();
        assert_eq!(endpoint, DATA_URL_PREFIX);
        assert!(RevocationBitmap::from_endpoint(&endpoint).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_endpoints() {
        assert!(RevocationBitmap::from_endpoint("https://example.com").is_err());
        let truncated = format!("{}{}", DATA_URL_PREFIX, URL_SAFE_NO_PAD.encode([0x80u8]));
        assert!(RevocationBitmap::from_endpoint(&truncated).is_err());
    }

    #[test]
    fn test_service_conversion() {
        let did = Did::placeholder("tst").unwrap();
        let mut bitmap = RevocationBitmap::new();
        bitmap.revoke(1);
        let service = bitmap.to_service(did.join("revoke").unwrap());
        assert_eq!(service.service_type, "RevocationBitmap2022");
        assert_eq!(RevocationBitmap::try_from(&service).unwrap(), bitmap);

        let mut wrong = service.clone();
        wrong.service_type = "LinkedDomains".into();
        assert!(matches!(
            RevocationBitmap::try_from(&wrong),
            Err(IdentityError::InvalidService(_))
        ));
    }
}
