use std::fmt;

/// Background color rendered for cells that were never minted.
pub const DEFAULT_COLOR: &str = "#ffffff";

/// The r/place palette offered in the sidebar.
pub const PALETTE: [&str; 16] = [
    "#ffffff", "#e4e4e4", "#888888", "#222222", "#ffa7d1", "#e50000", "#e59500", "#a06a42",
    "#e5d900", "#94e044", "#02be01", "#00d3dd", "#0083c7", "#0000ea", "#cf6ee4", "#820080",
];

/// An RGB color normalized to lowercase `#rrggbb`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Color(String);

impl Color {
    /// Accepts `#rgb` and `#rrggbb`, case-insensitive. The short form is
    /// expanded, so `#F00` and `#ff0000` compare equal.
    pub fn parse(value: &str) -> Result<Self, ColorError> {
        let value = value.trim();
        let Some(digits) = value.strip_prefix('#') else {
            return Err(ColorError::MissingHash);
        };
        if digits.len() != 3 && digits.len() != 6 {
            return Err(ColorError::InvalidLength { found: digits.len() });
        }
        for (index, ch) in digits.chars().enumerate() {
            if !ch.is_ascii_hexdigit() {
                return Err(ColorError::InvalidCharacter { ch, index });
            }
        }
        let mut normalized = String::with_capacity(7);
        normalized.push('#');
        if digits.len() == 3 {
            for ch in digits.chars() {
                let ch = ch.to_ascii_lowercase();
                normalized.push(ch);
                normalized.push(ch);
            }
        } else {
            normalized.extend(digits.chars().map(|ch| ch.to_ascii_lowercase()));
        }
        Ok(Self(normalized))
    }

    /// Lenient variant for values read back from the chain: anything that
    /// does not parse renders as the default background.
    pub fn parse_or_default(value: &str) -> Self {
        Self::parse(value).unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Self(DEFAULT_COLOR.to_string())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for Color {
    type Err = ColorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorError {
    MissingHash,
    InvalidLength { found: usize },
    InvalidCharacter { ch: char, index: usize },
}

impl fmt::Display for ColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorError::MissingHash => write!(f, "color must start with '#'"),
            ColorError::InvalidLength { found } => {
                write!(f, "color must have 3 or 6 hex digits, got {found}")
            }
            ColorError::InvalidCharacter { ch, index } => {
                write!(f, "invalid character '{ch}' at position {index}")
            }
        }
    }
}

impl std::error::Error for ColorError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_short_form() {
        assert_eq!(Color::parse("#F00").unwrap().as_str(), "#ff0000");
    }

    #[test]
    fn normalizes_case() {
        assert_eq!(Color::parse("#FFA7D1").unwrap().as_str(), "#ffa7d1");
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(Color::parse("ff0000"), Err(ColorError::MissingHash));
        assert_eq!(
            Color::parse("#ff00"),
            Err(ColorError::InvalidLength { found: 4 })
        );
        assert!(matches!(
            Color::parse("#ff00gg"),
            Err(ColorError::InvalidCharacter { ch: 'g', index: 4 })
        ));
    }

    #[test]
    fn palette_entries_are_valid() {
        for entry in PALETTE {
            let color = Color::parse(entry).unwrap();
            assert_eq!(color.as_str(), entry);
        }
    }
}
