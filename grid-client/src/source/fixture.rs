use serde_json::{json, Value};

use super::{
    http::{facility_records, status_rows},
    GridDataSource, LookupQuery, SourceError,
};
use crate::{
    domain::{ApplicationStatus, RawFacilityRecord},
    identifier::ChainIdentifier,
};

/// Offline `GridDataSource` serving canned response bodies.
///
/// Bodies go through the same result-list extraction as live responses, so a
/// saved response can be dropped in unchanged. Every query gets the same body.
#[derive(Debug, Clone)]
pub struct FixtureGridSource {
    capacity_body: Value,
    status_body: Value,
}

impl FixtureGridSource {
    pub fn new(capacity_body: Value, status_body: Value) -> Self {
        Self {
            capacity_body,
            status_body,
        }
    }

    /// Jeonju substation, transformer #3 and the saturated 이서 line.
    pub fn jeonju() -> Self {
        Self::new(
            json!({
                "dlt_resultList": [{
                    "SUBST_NM": "전주",
                    "SUBST_CAPA": 200000,
                    "SUBST_PWR": 101504,
                    "G_SUBST_CAPA": 94381,
                    "MTR_NO": "3",
                    "MTR_CAPA": 50000,
                    "MTR_PWR": 39259,
                    "G_MTR_CAPA": 35665,
                    "DL_NM": "이서",
                    "DL_CAPA": 12000,
                    "DL_PWR": 14915,
                    "G_DL_CAPA": 14314
                }]
            }),
            json!({
                "result": { "data": { "list": [{
                    "acptNo": "483020231115010412",
                    "pjNm": "춘포 태양광 발전소",
                    "rcptYmd": "20231115",
                    "schdYmd": "20240630",
                    "prgrsSttcNm": "공용망보강",
                    "jurisOfficeNm": "전주지사",
                    "mntrnDeptNm": "배전운영부"
                }] } }
            }),
        )
    }
}

impl Default for FixtureGridSource {
    fn default() -> Self {
        Self::jeonju()
    }
}

#[async_trait::async_trait]
impl GridDataSource for FixtureGridSource {
    async fn lookup(&self, query: &LookupQuery) -> Result<Vec<RawFacilityRecord>, SourceError> {
        query.validate()?;
        Ok(facility_records(Some(&self.capacity_body)))
    }

    async fn application_status(
        &self,
        _identifier: &ChainIdentifier,
    ) -> Result<Vec<ApplicationStatus>, SourceError> {
        Ok(status_rows(Some(&self.status_body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{normalize::summarize, source::AddressQuery, CapacityNormalizer};

    fn jeonju_address() -> LookupQuery {
        LookupQuery::Address(AddressQuery {
            province: "전북특별자치도".into(),
            city: "전주시".into(),
            district: "덕진구".into(),
            town: "강흥동".into(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn jeonju_fixture_is_saturated_at_the_line() {
        let source = FixtureGridSource::jeonju();
        let records = source.lookup(&jeonju_address()).await.unwrap();
        assert_eq!(records.len(), 1);

        let rows = CapacityNormalizer::default().normalize(&records);
        assert_eq!(rows.len(), 3);
        let summary = summarize(&rows);
        assert_eq!(summary.facility_count, 1);
        assert_eq!(summary.total_available_capacity, 0);
    }

    #[tokio::test]
    async fn fixture_still_validates_addresses() {
        let source = FixtureGridSource::default();
        let err = source
            .lookup(&LookupQuery::Address(AddressQuery::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn status_rows_render_dates() {
        let id = ChainIdentifier::parse("4830-20231115-010412").unwrap();
        let rows = FixtureGridSource::jeonju().application_status(&id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].received_on, "2023-11-15");
        assert_eq!(rows[0].scheduled_on, "2024-06-30");
    }

    #[tokio::test]
    async fn empty_fixture_is_no_data() {
        let source = FixtureGridSource::new(json!({ "dlt_resultList": [] }), json!({}));
        let id = ChainIdentifier::parse("12-2945-7459").unwrap();
        let records = source.lookup(&LookupQuery::Chain { identifier: id }).await.unwrap();
        assert!(records.is_empty());
    }
}
