use serde_json::{Map, Value};

/// Places a result list has been seen in capacity and status responses.
///
/// The endpoint names the list differently per query kind, so each location
/// is tried in `PRIORITY` order and the first non-empty array wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultListStrategy {
    DltResultList,
    ResultList,
    List,
    DataList,
    ResultDataList,
}

impl ResultListStrategy {
    pub const PRIORITY: [ResultListStrategy; 5] = [
        ResultListStrategy::DltResultList,
        ResultListStrategy::ResultList,
        ResultListStrategy::List,
        ResultListStrategy::DataList,
        ResultListStrategy::ResultDataList,
    ];

    pub fn pointer(self) -> &'static str {
        match self {
            ResultListStrategy::DltResultList => "/dlt_resultList",
            ResultListStrategy::ResultList => "/resultList",
            ResultListStrategy::List => "/list",
            ResultListStrategy::DataList => "/data/list",
            ResultListStrategy::ResultDataList => "/result/data/list",
        }
    }

    /// The list at this location, if it is a non-empty array.
    pub fn apply(self, body: &Value) -> Option<&Vec<Value>> {
        body.pointer(self.pointer())
            .and_then(Value::as_array)
            .filter(|items| !items.is_empty())
    }
}

/// Object entries of the first non-empty result list in `body`.
pub fn extract_result_list(body: &Value) -> Vec<Map<String, Value>> {
    for strategy in ResultListStrategy::PRIORITY {
        if let Some(items) = strategy.apply(body) {
            tracing::debug!(strategy = ?strategy, items = items.len(), "result list located");
            return items
                .iter()
                .filter_map(|item| item.as_object().cloned())
                .collect();
        }
    }
    Vec::new()
}
