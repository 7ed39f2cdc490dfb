pub mod extract;
pub mod fixture;
pub mod http;
pub mod substation;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    domain::{ApplicationStatus, RawFacilityRecord},
    identifier::{ChainIdentifier, IdentifierError},
};

pub use extract::{extract_result_list, ResultListStrategy};
pub use fixture::FixtureGridSource;
pub use http::{HttpSourceSettings, KepcoHttpSource};
pub use substation::{known_substation, substation_address};

const PREVIEW_CHARS: usize = 200;

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("malformed response body ({reason}): {preview}")]
    MalformedBody { reason: String, preview: String },
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error(transparent)]
    Identifier(#[from] IdentifierError),
    #[error("client configuration error: {0}")]
    Config(String),
}

impl SourceError {
    /// Transport failures and timeouts are worth retrying by hand; nothing else is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SourceError::Network(_))
    }

    pub(crate) fn malformed(reason: impl fmt::Display, body: &str) -> Self {
        SourceError::MalformedBody {
            reason: reason.to_string(),
            preview: preview(body),
        }
    }
}

fn preview(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Address-based capacity search. Serialized with the endpoint's own keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressQuery {
    #[serde(rename = "do")]
    pub province: String,
    #[serde(rename = "si")]
    pub city: String,
    #[serde(rename = "gu", default)]
    pub district: String,
    #[serde(rename = "lidong", default)]
    pub town: String,
    #[serde(rename = "li", default)]
    pub village: String,
    #[serde(rename = "jibun", default)]
    pub lot_number: String,
}

impl AddressQuery {
    pub fn validate(&self) -> Result<(), SourceError> {
        if self.province.trim().is_empty() || self.city.trim().is_empty() {
            return Err(SourceError::InvalidQuery(
                "address lookups need at least a province (do) and a city (si)".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for AddressQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = [
            &self.province,
            &self.city,
            &self.district,
            &self.town,
            &self.village,
            &self.lot_number,
        ];
        let joined: Vec<&str> = parts
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect();
        f.write_str(&joined.join(" "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "lowercase")]
pub enum LookupQuery {
    Address(AddressQuery),
    Chain { identifier: ChainIdentifier },
    /// Regional office and substation name, searched through the substation's site address.
    Substation { region: String, name: String },
}

impl LookupQuery {
    pub fn kind(&self) -> &'static str {
        match self {
            LookupQuery::Address(_) => "address",
            LookupQuery::Chain { .. } => "chain",
            LookupQuery::Substation { .. } => "substation",
        }
    }

    pub fn validate(&self) -> Result<(), SourceError> {
        match self {
            LookupQuery::Address(a) => a.validate(),
            LookupQuery::Substation { region, name } if region.trim().is_empty() || name.trim().is_empty() => Err(
                SourceError::InvalidQuery("substation lookups need a region and a substation name".to_string()),
            ),
            LookupQuery::Substation { .. } | LookupQuery::Chain { .. } => Ok(()),
        }
    }
}

impl fmt::Display for LookupQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupQuery::Address(a) => write!(f, "address {a}"),
            LookupQuery::Chain { identifier } => write!(f, "{identifier}"),
            LookupQuery::Substation { region, name } => write!(f, "substation {region} {name}"),
        }
    }
}

/// Where capacity records and request statuses come from.
///
/// Implementations own all I/O. "No data" is an empty vector, not an error.
#[async_trait::async_trait]
pub trait GridDataSource: Send + Sync {
    async fn lookup(&self, query: &LookupQuery) -> Result<Vec<RawFacilityRecord>, SourceError>;

    async fn application_status(
        &self,
        identifier: &ChainIdentifier,
    ) -> Result<Vec<ApplicationStatus>, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_long_bodies() {
        let body = "x".repeat(500);
        let SourceError::MalformedBody { preview, .. } = SourceError::malformed("eof", &body) else {
            panic!("expected malformed body");
        };
        assert_eq!(preview.len(), PREVIEW_CHARS + 3);
        assert!(preview.ends_with("..."));
        assert_eq!(super::preview("<html>"), "<html>");
    }

    #[test]
    fn address_query_requires_province_and_city() {
        let mut q = AddressQuery {
            province: "전북특별자치도".to_string(),
            ..Default::default()
        };
        assert!(matches!(q.validate(), Err(SourceError::InvalidQuery(_))));
        q.city = "전주시".to_string();
        assert!(q.validate().is_ok());
        assert_eq!(q.to_string(), "전북특별자치도 전주시");
    }

    #[test]
    fn address_query_uses_wire_keys() {
        let q: AddressQuery = serde_json::from_value(serde_json::json!({
            "do": "전북특별자치도", "si": "전주시", "gu": "덕진구", "jibun": "553-5"
        }))
        .unwrap();
        assert_eq!(q.district, "덕진구");
        assert_eq!(q.lot_number, "553-5");
        assert_eq!(q.village, "");
    }

    #[test]
    fn substation_query_needs_region_and_name() {
        let mapped = LookupQuery::Substation {
            region: "경기본부".into(),
            name: "수원변전소".into(),
        };
        assert!(mapped.validate().is_ok());
        assert_eq!(mapped.kind(), "substation");
        assert_eq!(mapped.to_string(), "substation 경기본부 수원변전소");

        let q: LookupQuery = serde_json::from_value(serde_json::json!({
            "by": "substation", "region": "전북본부", "name": " "
        }))
        .unwrap();
        assert!(matches!(q.validate(), Err(SourceError::InvalidQuery(_))));
    }

    #[test]
    fn only_network_errors_are_retryable() {
        assert!(!SourceError::InvalidQuery("x".into()).is_retryable());
        assert!(!SourceError::malformed("eof", "{").is_retryable());
    }
}
