use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Native currency amount in wei. u128 holds any realistic proceeds total.
///
/// Fields of this type use [`wei`] so JSON carries them as decimal strings.
pub type Wei = u128;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

/// Height of a block on the host chain.
pub type BlockNumber = u64;

pub type TokenId = u64;

/// Sequential epoch identifier, starting at 1.
pub type EpochId = u64;

/// 1-based calendar day counted from deployment.
pub type Day = u32;

// ── Address ──────────────────────────────────────────────────────────────────

/// 20-byte account address as used by the host chain.
///
/// Serializes as a `0x` hex string in human-readable formats (JSON) and as
/// raw bytes otherwise (bincode).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub fn from_bytes(b: [u8; 20]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse a hex address, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut arr = [0u8; 20];
        hex::decode_to_slice(s, &mut arr)?;
        Ok(Self(arr))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        if s.is_human_readable() {
            s.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(s)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        if d.is_human_readable() {
            let s = String::deserialize(d)?;
            Address::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            <[u8; 20]>::deserialize(d).map(Address)
        }
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({}…)", &self.to_hex()[..10])
    }
}

// ── Seed ─────────────────────────────────────────────────────────────────────

/// Opaque 32-byte reveal randomness. Consumed by the metadata collaborator;
/// the core never interprets it. Hex in JSON, raw bytes in bincode.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Seed(pub [u8; 32]);

impl Seed {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut arr = [0u8; 32];
        hex::decode_to_slice(s, &mut arr)?;
        Ok(Self(arr))
    }
}

impl Serialize for Seed {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        if s.is_human_readable() {
            s.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(s)
        }
    }
}

impl<'de> Deserialize<'de> for Seed {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        if d.is_human_readable() {
            let s = String::deserialize(d)?;
            Seed::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            <[u8; 32]>::deserialize(d).map(Seed)
        }
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed({}…)", &self.to_hex()[..16])
    }
}

// ── Wei codec ────────────────────────────────────────────────────────────────

/// `#[serde(with = "tessera_core::types::wei")]` for [`Wei`] fields.
///
/// JSON numbers top out at `u64` without precision loss, so human-readable
/// formats get a decimal string. Plain numbers are still accepted on input up
/// to `u64::MAX`; anything larger must be quoted. Binary formats keep `u128`.
pub mod wei {
    use super::Wei;
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &Wei, s: S) -> Result<S::Ok, S::Error> {
        if s.is_human_readable() {
            s.collect_str(value)
        } else {
            s.serialize_u128(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Wei, D::Error> {
        if d.is_human_readable() {
            d.deserialize_any(WeiVisitor)
        } else {
            d.deserialize_u128(WeiVisitor)
        }
    }

    struct WeiVisitor;

    impl<'de> Visitor<'de> for WeiVisitor {
        type Value = Wei;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a wei amount as a decimal string or unsigned integer")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Wei, E> {
            Ok(Wei::from(v))
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<Wei, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Wei, E> {
            Wei::try_from(v).map_err(|_| E::custom(format!("negative wei amount {v}")))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Wei, E> {
            Err(E::custom(format!(
                "wei amount {v} is not an exact integer; quote amounts above u64::MAX"
            )))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Wei, E> {
            v.parse()
                .map_err(|_| E::custom(format!("invalid wei amount {v:?}")))
        }
    }
}

// ── BlockContext ─────────────────────────────────────────────────────────────

/// The block a call executes in. The only source of time the engine sees.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    pub number: BlockNumber,
    pub timestamp: Timestamp,
}

impl BlockContext {
    pub fn new(number: BlockNumber, timestamp: Timestamp) -> Self {
        Self { number, timestamp }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_hex_accepts_optional_prefix() {
        let a = Address::from_hex("0x895e58968819E821465857CDbE33B82027527747").unwrap();
        let b = Address::from_hex("895e58968819e821465857cdbe33b82027527747").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_hex(), "0x895e58968819e821465857cdbe33b82027527747");
    }

    #[test]
    fn address_hex_rejects_wrong_length() {
        assert!(Address::from_hex("0x1234").is_err());
    }

    #[test]
    fn json_uses_hex_strings() {
        let a = Address::from_bytes([0xab; 20]);
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, format!("\"{}\"", a.to_hex()));
        assert_eq!(serde_json::from_str::<Address>(&json).unwrap(), a);

        let seed = Seed([7u8; 32]);
        let json = serde_json::to_string(&seed).unwrap();
        assert_eq!(serde_json::from_str::<Seed>(&json).unwrap(), seed);
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Priced {
        #[serde(with = "wei")]
        amount: Wei,
    }

    #[test]
    fn wei_above_u64_is_a_json_string() {
        let big = Priced { amount: 100 * 1_000_000_000_000_000_000 };
        let value = serde_json::to_value(&big).unwrap();
        assert_eq!(value["amount"], "100000000000000000000");
        assert_eq!(serde_json::from_value::<Priced>(value).unwrap(), big);

        let max = Priced { amount: u128::MAX };
        let json = serde_json::to_string(&max).unwrap();
        assert_eq!(serde_json::from_str::<Priced>(&json).unwrap(), max);

        let bytes = bincode::serialize(&max).unwrap();
        assert_eq!(bincode::deserialize::<Priced>(&bytes).unwrap(), max);
    }

    #[test]
    fn wei_accepts_small_numbers_and_rejects_lossy_ones() {
        let p: Priced = serde_json::from_str(r#"{"amount": 42}"#).unwrap();
        assert_eq!(p.amount, 42);
        assert!(serde_json::from_str::<Priced>(r#"{"amount": -1}"#).is_err());
        let err = serde_json::from_str::<Priced>(r#"{"amount": 100000000000000000000}"#)
            .unwrap_err()
            .to_string();
        assert!(err.contains("quote amounts"), "{err}");
        assert!(serde_json::from_str::<Priced>(r#"{"amount": "1e18"}"#).is_err());
    }
}
