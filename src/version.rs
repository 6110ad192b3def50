//! ECMAScript editions understood by the checker.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::CheckError;

/// A grammar edition. Ordering follows publication order, `Latest` sorts last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EcmaVersion {
    Es5,
    Es2015,
    Es2016,
    Es2017,
    Es2018,
    Es2019,
    Es2020,
    Es2021,
    Es2022,
    Es2023,
    Es2024,
    Es2025,
    Latest,
}

impl EcmaVersion {
    pub const ALL: [EcmaVersion; 13] = [
        EcmaVersion::Es5,
        EcmaVersion::Es2015,
        EcmaVersion::Es2016,
        EcmaVersion::Es2017,
        EcmaVersion::Es2018,
        EcmaVersion::Es2019,
        EcmaVersion::Es2020,
        EcmaVersion::Es2021,
        EcmaVersion::Es2022,
        EcmaVersion::Es2023,
        EcmaVersion::Es2024,
        EcmaVersion::Es2025,
        EcmaVersion::Latest,
    ];

    /// Publication year, `None` for ES5 and `Latest`.
    pub fn year(self) -> Option<u32> {
        match self {
            EcmaVersion::Es5 | EcmaVersion::Latest => None,
            other => Some(2015 + (other as u32) - (EcmaVersion::Es2015 as u32)),
        }
    }

    pub fn from_year(year: u32) -> Option<Self> {
        if !(2015..=2025).contains(&year) {
            return None;
        }
        Self::ALL
            .get((year - 2015) as usize + EcmaVersion::Es2015 as usize)
            .copied()
    }

    /// The edition right before this one.
    pub fn previous(self) -> Option<Self> {
        let idx = self as usize;
        if idx == 0 {
            None
        } else {
            Self::ALL.get(idx - 1).copied()
        }
    }
}

impl fmt::Display for EcmaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcmaVersion::Es5 => f.write_str("es5"),
            EcmaVersion::Latest => f.write_str("latest"),
            other => write!(f, "es{}", other.year().unwrap_or_default()),
        }
    }
}

impl FromStr for EcmaVersion {
    type Err = CheckError;

    /// Accepts `es5`, `5`, `es2015`, `2015`, `es6`, `6` … `16`, and `latest`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "latest" || lower == "esnext" {
            return Ok(EcmaVersion::Latest);
        }
        let digits = lower.strip_prefix("es").unwrap_or(&lower);
        let number: u32 = digits
            .parse()
            .map_err(|_| CheckError::InvalidVersion(s.to_string()))?;
        match number {
            5 => Ok(EcmaVersion::Es5),
            6..=16 => EcmaVersion::from_year(number + 2009)
                .ok_or_else(|| CheckError::InvalidVersion(s.to_string())),
            2015..=2025 => EcmaVersion::from_year(number)
                .ok_or_else(|| CheckError::InvalidVersion(s.to_string())),
            _ => Err(CheckError::InvalidVersion(s.to_string())),
        }
    }
}

impl Serialize for EcmaVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for EcmaVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u32),
            Text(String),
        }

        let text = match Raw::deserialize(deserializer)? {
            Raw::Number(n) => n.to_string(),
            Raw::Text(s) => s,
        };
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_spellings() {
        assert_eq!("es5".parse::<EcmaVersion>().unwrap(), EcmaVersion::Es5);
        assert_eq!("6".parse::<EcmaVersion>().unwrap(), EcmaVersion::Es2015);
        assert_eq!("es6".parse::<EcmaVersion>().unwrap(), EcmaVersion::Es2015);
        assert_eq!("2020".parse::<EcmaVersion>().unwrap(), EcmaVersion::Es2020);
        assert_eq!("ES2019".parse::<EcmaVersion>().unwrap(), EcmaVersion::Es2019);
        assert_eq!("16".parse::<EcmaVersion>().unwrap(), EcmaVersion::Es2025);
        assert_eq!("latest".parse::<EcmaVersion>().unwrap(), EcmaVersion::Latest);
        assert!("es4".parse::<EcmaVersion>().is_err());
        assert!("es2030".parse::<EcmaVersion>().is_err());
        assert!("modern".parse::<EcmaVersion>().is_err());
    }

    #[test]
    fn test_display_and_order() {
        assert_eq!(EcmaVersion::Es2020.to_string(), "es2020");
        assert_eq!(EcmaVersion::Es5.to_string(), "es5");
        assert!(EcmaVersion::Es2019 < EcmaVersion::Es2020);
        assert!(EcmaVersion::Es2025 < EcmaVersion::Latest);
        assert_eq!(EcmaVersion::Es2020.previous(), Some(EcmaVersion::Es2019));
        assert_eq!(EcmaVersion::Es5.previous(), None);
    }

    #[test]
    fn test_deserialize_number_or_string() {
        let v: EcmaVersion = serde_json::from_str("2018").unwrap();
        assert_eq!(v, EcmaVersion::Es2018);
        let v: EcmaVersion = serde_json::from_str("\"es2021\"").unwrap();
        assert_eq!(v, EcmaVersion::Es2021);
    }
}
