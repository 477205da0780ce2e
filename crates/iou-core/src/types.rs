use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::CoreError;

/// Value in minor units (pence, cents, ...) of a single currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Amount {
    /// Value in the smallest unit of the currency.
    pub value: u128,
    /// The currency of this amount.
    pub currency: Currency,
}

impl Amount {
    /// Create a new amount.
    pub fn new(value: u128, currency: Currency) -> Self {
        Self { value, currency }
    }

    /// A zero amount in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self { value: 0, currency }
    }

    /// Create an amount from whole units, scaled by the currency's decimals.
    ///
    /// `Amount::from_major(10, Currency::GBP)` is 1000 pence.
    pub fn from_major(units: u64, currency: Currency) -> Result<Self, CoreError> {
        let scale = 10u128
            .checked_pow(currency.decimals())
            .ok_or(CoreError::AmountOverflow)?;
        let value = (units as u128)
            .checked_mul(scale)
            .ok_or(CoreError::AmountOverflow)?;
        Ok(Self { value, currency })
    }

    /// Check if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// Fail unless `other` is denominated in the same currency.
    pub fn ensure_same_currency(&self, other: &Amount) -> Result<(), CoreError> {
        if self.currency != other.currency {
            return Err(CoreError::CurrencyMismatch {
                left: self.currency,
                right: other.currency,
            });
        }
        Ok(())
    }

    pub fn checked_add(&self, other: &Amount) -> Result<Amount, CoreError> {
        self.ensure_same_currency(other)?;
        let value = self
            .value
            .checked_add(other.value)
            .ok_or(CoreError::AmountOverflow)?;
        Ok(Amount::new(value, self.currency))
    }

    pub fn checked_sub(&self, other: &Amount) -> Result<Amount, CoreError> {
        self.ensure_same_currency(other)?;
        let value = self
            .value
            .checked_sub(other.value)
            .ok_or_else(|| CoreError::AmountUnderflow {
                left: self.clone(),
                right: other.clone(),
            })?;
        Ok(Amount::new(value, self.currency))
    }

    /// Compare two amounts of the same currency.
    pub fn try_cmp(&self, other: &Amount) -> Result<Ordering, CoreError> {
        self.ensure_same_currency(other)?;
        Ok(self.value.cmp(&other.value))
    }

    /// Sum a sequence of amounts, all of which must share one currency.
    /// Returns `None` for an empty sequence.
    pub fn sum<'a>(amounts: impl IntoIterator<Item = &'a Amount>) -> Result<Option<Amount>, CoreError> {
        let mut total: Option<Amount> = None;
        for amount in amounts {
            total = Some(match total {
                None => amount.clone(),
                Some(acc) => acc.checked_add(amount)?,
            });
        }
        Ok(total)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let decimals = self.currency.decimals();
        if decimals == 0 {
            return write!(f, "{} {}", self.value, self.currency);
        }
        let scale = 10u128.pow(decimals);
        write!(
            f,
            "{}.{:0width$} {}",
            self.value / scale,
            self.value % scale,
            self.currency,
            width = decimals as usize
        )
    }
}

/// ISO 4217 currencies a debt note or cash holding can be denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    BRL,
    USD,
    EUR,
    GBP,
    JPY,
    CNY,
    CHF,
    AUD,
    CAD,
    INR,
    MXN,
}

impl Currency {
    /// ISO 4217 code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BRL => "BRL",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::JPY => "JPY",
            Self::CNY => "CNY",
            Self::CHF => "CHF",
            Self::AUD => "AUD",
            Self::CAD => "CAD",
            Self::INR => "INR",
            Self::MXN => "MXN",
        }
    }

    /// Number of decimal places in the minor unit.
    pub fn decimals(&self) -> u32 {
        match self {
            Self::JPY => 0,
            _ => 2,
        }
    }

    /// Parse from ISO 4217 code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "BRL" => Some(Self::BRL),
            "USD" => Some(Self::USD),
            "EUR" => Some(Self::EUR),
            "GBP" => Some(Self::GBP),
            "JPY" => Some(Self::JPY),
            "CNY" => Some(Self::CNY),
            "CHF" => Some(Self::CHF),
            "AUD" => Some(Self::AUD),
            "CAD" => Some(Self::CAD),
            "INR" => Some(Self::INR),
            "MXN" => Some(Self::MXN),
            _ => None,
        }
    }
}

impl FromStr for Currency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        Self::from_code(&code).ok_or(CoreError::UnknownCurrency(s.to_string()))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Ed25519 public key bytes. The key that signs for a party or a holding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwningKey(pub [u8; 32]);

impl OwningKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidKey(format!("invalid hex: {}", e)))?;
        let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            CoreError::InvalidKey(format!("key must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }

    /// First eight hex characters, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for OwningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwningKey({})", self.short())
    }
}

impl fmt::Display for OwningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for OwningKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for OwningKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// X.500-style legal name: `O=<organisation>, L=<locality>, C=<country>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PartyName {
    pub organisation: String,
    pub locality: String,
    pub country: String,
}

impl PartyName {
    pub fn new(
        organisation: impl Into<String>,
        locality: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            organisation: organisation.into(),
            locality: locality.into(),
            country: country.into(),
        }
    }

    /// Parse `O=PartyA,L=London,C=GB`. Attribute order and whitespace
    /// around separators are not significant.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let mut organisation = None;
        let mut locality = None;
        let mut country = None;

        for part in s.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| CoreError::InvalidPartyName(format!("malformed attribute '{}' in {}", part.trim(), s)))?;
            let value = value.trim();
            if value.is_empty() {
                return Err(CoreError::InvalidPartyName(format!(
                    "empty attribute '{}' in {}",
                    key.trim(),
                    s
                )));
            }
            match key.trim() {
                "O" => organisation = Some(value.to_string()),
                "L" => locality = Some(value.to_string()),
                "C" => country = Some(value.to_string()),
                other => {
                    return Err(CoreError::InvalidPartyName(format!(
                        "unsupported attribute '{}' in {}",
                        other, s
                    )))
                }
            }
        }

        match (organisation, locality, country) {
            (Some(o), Some(l), Some(c)) => Ok(Self::new(o, l, c)),
            _ => Err(CoreError::InvalidPartyName(format!(
                "name must have O, L and C attributes, got: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for PartyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "O={}, L={}, C={}", self.organisation, self.locality, self.country)
    }
}

impl FromStr for PartyName {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PartyName {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<PartyName> for String {
    fn from(name: PartyName) -> Self {
        name.to_string()
    }
}

/// A well-known identity: a legal name bound to its owning key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Party {
    pub name: PartyName,
    pub owning_key: OwningKey,
}

impl Party {
    pub fn new(name: PartyName, owning_key: OwningKey) -> Self {
        Self { name, owning_key }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A party plus an opaque reference, identifying who issued a cash holding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartyAndReference {
    pub party: Party,
    pub reference: Vec<u8>,
}

impl PartyAndReference {
    pub fn new(party: Party, reference: impl Into<Vec<u8>>) -> Self {
        Self {
            party,
            reference: reference.into(),
        }
    }
}

/// Identifier shared by every version of a debt note.
///
/// Equality and hashing consider only the UUID; the external id is a
/// human-facing label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearId {
    pub external_id: Option<String>,
    pub id: uuid::Uuid,
}

impl LinearId {
    pub fn new() -> Self {
        Self {
            external_id: None,
            id: uuid::Uuid::new_v4(),
        }
    }

    pub fn with_external_id(external_id: impl Into<String>) -> Self {
        Self {
            external_id: Some(external_id.into()),
            id: uuid::Uuid::new_v4(),
        }
    }
}

impl Default for LinearId {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for LinearId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for LinearId {}

impl Hash for LinearId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for LinearId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.external_id {
            Some(external) => write!(f, "{}_{}", external, self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

impl FromStr for LinearId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (external_id, uuid_part) = match s.rsplit_once('_') {
            Some((external, id)) => (Some(external.to_string()), id),
            None => (None, s),
        };
        let id = uuid::Uuid::parse_str(uuid_part)
            .map_err(|e| CoreError::InvalidLinearId(format!("{}: {}", s, e)))?;
        Ok(Self { external_id, id })
    }
}
