use std::fmt;

/// A 20-byte account address, parsed from `0x`-prefixed hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// Mint transfers originate from the zero address.
    pub const ZERO: Address = Address([0; 20]);

    pub fn parse(value: &str) -> Result<Self, AddressError> {
        let value = value.trim();
        let Some(digits) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) else {
            return Err(AddressError::MissingPrefix);
        };
        if digits.len() != 40 {
            return Err(AddressError::InvalidLength { found: digits.len() });
        }
        for (index, ch) in digits.chars().enumerate() {
            if !ch.is_ascii_hexdigit() {
                return Err(AddressError::InvalidCharacter { ch, index });
            }
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits.to_ascii_lowercase(), &mut bytes)
            .map_err(|_| AddressError::InvalidLength { found: digits.len() })?;
        Ok(Self(bytes))
    }

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// `0x1234…abcd` form used in notifications.
    pub fn short(&self) -> String {
        let full = self.to_string();
        format!("{}...{}", &full[..6], &full[full.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl std::str::FromStr for Address {
    type Err = AddressError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressError {
    MissingPrefix,
    InvalidLength { found: usize },
    InvalidCharacter { ch: char, index: usize },
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressError::MissingPrefix => write!(f, "address must start with 0x"),
            AddressError::InvalidLength { found } => {
                write!(f, "address must have 40 hex digits, got {found}")
            }
            AddressError::InvalidCharacter { ch, index } => {
                write!(f, "invalid character '{ch}' at position {index}")
            }
        }
    }
}

impl std::error::Error for AddressError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_lowercase() {
        let raw = "0x82d0b70ad6fcdb8aad6048f86afca83d69f556b9";
        let address = Address::parse(raw).unwrap();
        assert_eq!(address.to_string(), raw);
    }

    #[test]
    fn accepts_mixed_case() {
        let address = Address::parse("0x82D0B70aD6Fcdb8aAD6048f86afca83D69F556b9").unwrap();
        assert_eq!(
            address.to_string(),
            "0x82d0b70ad6fcdb8aad6048f86afca83d69f556b9"
        );
    }

    #[test]
    fn short_form() {
        let address = Address::parse("0x82d0b70ad6fcdb8aad6048f86afca83d69f556b9").unwrap();
        assert_eq!(address.short(), "0x82d0...56b9");
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(Address::parse("82d0"), Err(AddressError::MissingPrefix));
        assert_eq!(
            Address::parse("0x1234"),
            Err(AddressError::InvalidLength { found: 4 })
        );
        assert!(matches!(
            Address::parse("0xzz00000000000000000000000000000000000000"),
            Err(AddressError::InvalidCharacter { ch: 'z', index: 0 })
        ));
        assert!(Address::ZERO.is_zero());
    }
}
