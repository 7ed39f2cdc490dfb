use std::{fmt, ops::RangeInclusive, str::FromStr};

use serde::{Deserialize, Serialize};

const CUSTOMER_DIGITS: RangeInclusive<usize> = 10..=12;
const RECEIPT_DIGITS: RangeInclusive<usize> = 15..=20;
const OFFICE_CODE_LEN: usize = 4;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("identifier contains no digits")]
    Empty,
    #[error("identifier has {digits} digits; expected a customer number (10-12) or a receipt number (15-20)")]
    UnrecognizedLength { digits: usize },
}

/// A customer or receipt number identifying one connection request chain.
///
/// Users type these with arbitrary separators (`12-2945-7459`,
/// `4830-20231115-010412`); only the digits are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "digits", rename_all = "lowercase")]
pub enum ChainIdentifier {
    Customer(String),
    Receipt(String),
}

impl ChainIdentifier {
    pub fn parse(input: &str) -> Result<Self, IdentifierError> {
        let digits: String = input.chars().filter(char::is_ascii_digit).collect();
        let len = digits.len();

        if len == 0 {
            Err(IdentifierError::Empty)
        } else if CUSTOMER_DIGITS.contains(&len) {
            Ok(Self::Customer(digits))
        } else if RECEIPT_DIGITS.contains(&len) {
            Ok(Self::Receipt(digits))
        } else {
            Err(IdentifierError::UnrecognizedLength { digits: len })
        }
    }

    pub fn digits(&self) -> &str {
        match self {
            Self::Customer(d) | Self::Receipt(d) => d,
        }
    }

    /// Regional office code carried by receipt numbers (their first 4 digits).
    pub fn office_code(&self) -> Option<&str> {
        match self {
            Self::Receipt(d) => Some(&d[..OFFICE_CODE_LEN]),
            Self::Customer(_) => None,
        }
    }

    pub fn office_code_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.office_code().unwrap_or(default)
    }

    /// Request-body key naming this identifier.
    pub fn wire_key(&self) -> &'static str {
        match self {
            Self::Customer(_) => "custNo",
            Self::Receipt(_) => "acptNo",
        }
    }
}

impl FromStr for ChainIdentifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ChainIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Customer(d) => write!(f, "customer {d}"),
            Self::Receipt(d) => write!(f, "receipt {d}"),
        }
    }
}
