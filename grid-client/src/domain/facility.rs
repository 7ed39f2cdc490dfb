use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One facility chain as returned by the capacity lookup, kept untyped.
///
/// Numeric fields may arrive as JSON numbers or as display strings such as
/// `"12,345 kW"`; interpretation is left to the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawFacilityRecord(Map<String, Value>);

impl RawFacilityRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wraps a JSON value if it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    /// Value for `key`, treating JSON `null` as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// First non-null value among `keys`.
    pub fn first_of(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter().find_map(|k| self.get(k))
    }

    /// Text of the first present key; numbers are rendered, blank strings skipped.
    pub fn text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| match self.get(k)? {
            Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any capacity field of `stage` is present.
    pub fn has_stage(&self, stage: StageKind) -> bool {
        let f = stage.fields();
        self.first_of(f.standard)
            .or_else(|| self.first_of(f.received))
            .or_else(|| self.first_of(f.planned))
            .is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Substation,
    Transformer,
    Line,
}

/// Wire keys for one stage. The first present key wins; Korean display labels
/// are accepted because saved dashboard responses use them.
#[derive(Debug)]
pub struct StageFields {
    pub standard: &'static [&'static str],
    pub received: &'static [&'static str],
    pub planned: &'static [&'static str],
    pub name: &'static [&'static str],
    pub code: &'static [&'static str],
}

static SUBSTATION_FIELDS: StageFields = StageFields {
    standard: &["SUBST_CAPA", "변전소접속기준용량"],
    received: &["SUBST_PWR", "변전소접수기준접속용량"],
    planned: &["G_SUBST_CAPA", "변전소접속계획반영접속용량"],
    name: &["SUBST_NM", "변전소"],
    code: &["SUBST_CD", "변전소코드"],
};

static TRANSFORMER_FIELDS: StageFields = StageFields {
    standard: &["MTR_CAPA", "주변압기접속기준용량"],
    received: &["MTR_PWR", "주변압기접수기준접속용량"],
    planned: &["G_MTR_CAPA", "주변압기접속계획반영접속용량"],
    name: &["MTR_NM", "주변압기"],
    code: &["MTR_NO"],
};

static LINE_FIELDS: StageFields = StageFields {
    standard: &["DL_CAPA", "배전선로접속기준용량"],
    received: &["DL_PWR", "배전선로접수기준접속용량"],
    planned: &["G_DL_CAPA", "배전선로접속계획반영접속용량"],
    name: &["DL_NM", "배전선로"],
    code: &["DL_CD", "배전선로코드"],
};

impl StageKind {
    /// Chain order: substation, then transformer, then line.
    pub const CHAIN: [StageKind; 3] = [StageKind::Substation, StageKind::Transformer, StageKind::Line];

    pub fn fields(self) -> &'static StageFields {
        match self {
            StageKind::Substation => &SUBSTATION_FIELDS,
            StageKind::Transformer => &TRANSFORMER_FIELDS,
            StageKind::Line => &LINE_FIELDS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::Substation => "substation",
            StageKind::Transformer => "transformer",
            StageKind::Line => "line",
        }
    }

    /// Display name of this stage within `record`; `"-"` when unnamed.
    ///
    /// Transformers are usually only numbered, so `MTR_NO = 3` becomes `#3`.
    pub fn display_name(self, record: &RawFacilityRecord) -> String {
        let f = self.fields();
        if let Some(name) = record.text(f.name) {
            return name;
        }
        match (self, record.text(f.code)) {
            (StageKind::Transformer, Some(no)) => format!("#{no}"),
            _ => "-".to_string(),
        }
    }

    pub fn code(self, record: &RawFacilityRecord) -> Option<String> {
        record.text(self.fields().code)
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
