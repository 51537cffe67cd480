use serde::{Deserialize, Serialize};

/// Columns of a processed access log, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Ip,
    Datetime,
    RequestType,
    Request,
    Status,
    Size,
    Referrer,
    UserAgent,
}

impl Field {
    /// Every field in column order. Records, schemas and rendered output
    /// all follow this order.
    pub const ALL: [Field; 8] = [
        Field::Ip,
        Field::Datetime,
        Field::RequestType,
        Field::Request,
        Field::Status,
        Field::Size,
        Field::Referrer,
        Field::UserAgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Ip => "ip",
            Field::Datetime => "datetime",
            Field::RequestType => "request_type",
            Field::Request => "request",
            Field::Status => "status",
            Field::Size => "size",
            Field::Referrer => "referrer",
            Field::UserAgent => "user_agent",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Head,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
}

impl HttpMethod {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "HEAD" => Some(HttpMethod::Head),
            "PUT" => Some(HttpMethod::Put),
            "DELETE" => Some(HttpMethod::Delete),
            "CONNECT" => Some(HttpMethod::Connect),
            "OPTIONS" => Some(HttpMethod::Options),
            "TRACE" => Some(HttpMethod::Trace),
            "PATCH" => Some(HttpMethod::Patch),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Head => "HEAD",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Connect => "CONNECT",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
            HttpMethod::Patch => "PATCH",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Placeholder token servers write when there is no size or referrer.
pub const PLACEHOLDER: &str = "-";

const TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// One structured row. `None` means the field's pattern did not match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub ip: Option<String>,
    pub datetime: Option<String>,
    pub request_type: Option<String>,
    pub request: Option<String>,
    pub status: Option<String>,
    pub size: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

impl LogRecord {
    pub fn get(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::Ip => &self.ip,
            Field::Datetime => &self.datetime,
            Field::RequestType => &self.request_type,
            Field::Request => &self.request,
            Field::Status => &self.status,
            Field::Size => &self.size,
            Field::Referrer => &self.referrer,
            Field::UserAgent => &self.user_agent,
        };
        value.as_deref()
    }

    pub fn set(&mut self, field: Field, value: Option<String>) {
        let slot = match field {
            Field::Ip => &mut self.ip,
            Field::Datetime => &mut self.datetime,
            Field::RequestType => &mut self.request_type,
            Field::Request => &mut self.request,
            Field::Status => &mut self.status,
            Field::Size => &mut self.size,
            Field::Referrer => &mut self.referrer,
            Field::UserAgent => &mut self.user_agent,
        };
        *slot = value;
    }

    /// Values in column order.
    pub fn values(&self) -> [Option<&str>; 8] {
        Field::ALL.map(|field| self.get(field))
    }

    pub fn is_complete(&self) -> bool {
        self.values().iter().all(Option::is_some)
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status.as_deref()?.parse().ok()
    }

    /// Response size in bytes. The `-` placeholder maps to `None`, the raw
    /// token stays available in `size`.
    pub fn size_bytes(&self) -> Option<u64> {
        self.size.as_deref()?.parse().ok()
    }

    pub fn method(&self) -> Option<HttpMethod> {
        HttpMethod::parse(self.request_type.as_deref()?)
    }

    pub fn timestamp(&self) -> Option<jiff::Timestamp> {
        let datetime = self.datetime.as_deref()?;
        jiff::Timestamp::strptime(TIMESTAMP_FORMAT, datetime).ok()
    }

    pub fn has_referrer(&self) -> bool {
        matches!(self.referrer.as_deref(), Some(r) if r != PLACEHOLDER)
    }
}

/// Per-table statistics used for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    pub total: usize,
    pub complete: usize,
    /// Absent counts in column order.
    pub absent: Vec<(Field, usize)>,
    /// Records whose referrer is present and not `-`.
    pub with_referrer: usize,
    /// Sum of numeric sizes; `-` and absent sizes count as nothing.
    pub bytes_sent: u64,
    /// Earliest and latest parseable timestamps.
    pub time_range: Option<(jiff::Timestamp, jiff::Timestamp)>,
}

/// Extracted records, in the order of the source lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProcessedTable {
    records: Vec<LogRecord>,
}

impl ProcessedTable {
    pub fn new(records: Vec<LogRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All values of one column, in row order.
    pub fn column(&self, field: Field) -> Vec<Option<&str>> {
        self.records.iter().map(|r| r.get(field)).collect()
    }

    pub fn into_records(self) -> Vec<LogRecord> {
        self.records
    }

    pub fn summary(&self) -> TableSummary {
        let absent = Field::ALL
            .iter()
            .map(|&field| {
                let missing = self.records.iter().filter(|r| r.get(field).is_none()).count();
                (field, missing)
            })
            .collect();

        let time_range = self
            .records
            .iter()
            .filter_map(LogRecord::timestamp)
            .fold(None, |range, ts| match range {
                None => Some((ts, ts)),
                Some((first, last)) => Some((first.min(ts), last.max(ts))),
            });

        TableSummary {
            total: self.records.len(),
            complete: self.records.iter().filter(|r| r.is_complete()).count(),
            absent,
            with_referrer: self.records.iter().filter(|r| r.has_referrer()).count(),
            bytes_sent: self.records.iter().filter_map(LogRecord::size_bytes).sum(),
            time_range,
        }
    }
}

impl<'a> IntoIterator for &'a ProcessedTable {
    type Item = &'a LogRecord;
    type IntoIter = std::slice::Iter<'a, LogRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
