use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::{macros::format_description, Date};

/// Progress of one interconnection request, as shown by the receipt-status lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationStatus {
    pub receipt_no: String,
    pub project_name: String,
    pub received_on: String,
    pub scheduled_on: String,
    pub progress: String,
    pub office: String,
    pub department: String,
}

impl ApplicationStatus {
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        let text = |key: &str| match fields.get(key) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };

        Self {
            receipt_no: text("acptNo"),
            project_name: text("pjNm"),
            received_on: render_compact_date(&text("rcptYmd")),
            scheduled_on: render_compact_date(&text("schdYmd")),
            progress: text("prgrsSttcNm"),
            office: text("jurisOfficeNm"),
            department: text("mntrnDeptNm"),
        }
    }
}

/// `20231115` -> `2023-11-15`; anything else is returned unchanged.
pub fn render_compact_date(raw: &str) -> String {
    Date::parse(raw, format_description!("[year][month][day]"))
        .ok()
        .and_then(|d| d.format(format_description!("[year]-[month]-[day]")).ok())
        .unwrap_or_else(|| raw.to_string())
}
