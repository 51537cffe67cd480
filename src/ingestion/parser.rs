use crate::ingestion::models::{Field, LogRecord, ProcessedTable};
use crate::ingestion::reader::RawLogFile;
use lazy_static::lazy_static;
use regex::Regex;

/// A named rule capturing one field from a raw line. Group 1 of `pattern`
/// holds the value.
pub struct FieldExtractor {
    pub field: Field,
    pub pattern: Regex,
}

impl FieldExtractor {
    fn new(field: Field, pattern: &str) -> Self {
        Self {
            field,
            pattern: Regex::new(pattern).unwrap(),
        }
    }

    pub fn capture<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.pattern
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

const METHODS: &str = "GET|POST|HEAD|PUT|DELETE|CONNECT|OPTIONS|TRACE|PATCH";

lazy_static! {
    /// Extraction rules in column order, matched against
    /// `IP - - [TIMESTAMP] "METHOD TARGET HTTP/x.y" STATUS SIZE "REFERRER" "USER_AGENT"`.
    pub static ref FIELD_EXTRACTORS: Vec<FieldExtractor> = vec![
        FieldExtractor::new(Field::Ip, r"^(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})\b"),
        FieldExtractor::new(Field::Datetime, r"\[([^\]]*)\]"),
        FieldExtractor::new(Field::RequestType, &format!(r#""({METHODS}) "#)),
        FieldExtractor::new(Field::Request, &format!(r#""(?:{METHODS}) (.*?) HTTP/[\d.]+""#)),
        FieldExtractor::new(Field::Status, r#"" (\d{3}) "#),
        FieldExtractor::new(Field::Size, r#"" \d{3} (\d+|-)(?: |$)"#),
        FieldExtractor::new(Field::Referrer, r#"" \d{3} (?:\d+|-) "([^"]*)""#),
        FieldExtractor::new(Field::UserAgent, r#"" "([^"]+)"$"#),
    ];
}

/// Apply every extractor to a single line. Never fails; unmatched fields
/// are left as `None`.
pub fn extract_line(line: &str) -> LogRecord {
    let mut record = LogRecord::default();
    for extractor in FIELD_EXTRACTORS.iter() {
        record.set(extractor.field, extractor.capture(line).map(str::to_string));
    }
    record
}

/// Turn every raw line into a record, preserving line order.
pub fn extract(raw: &RawLogFile) -> ProcessedTable {
    tracing::debug!("Extracting {} fields from {} lines", FIELD_EXTRACTORS.len(), raw.len());

    let records: Vec<LogRecord> = raw
        .lines()
        .iter()
        .enumerate()
        .map(|(idx, line)| {
            let record = extract_line(line);
            tracing::trace!("Line {}: {:?}", idx + 1, record);
            record
        })
        .collect();

    let table = ProcessedTable::new(records);
    for (field, missing) in table.summary().absent {
        if missing > 0 {
            tracing::debug!("Field '{}' absent in {} of {} lines", field, missing, table.len());
        }
    }

    tracing::info!("Data processing complete with {} entries", table.len());
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::fixtures::{BINGBOT, PETALBOT};

    #[test]
    fn test_extractor_order_matches_columns() {
        let fields: Vec<Field> = FIELD_EXTRACTORS.iter().map(|e| e.field).collect();
        assert_eq!(fields, Field::ALL.to_vec());
    }

    #[test]
    fn test_extract_petalbot_line() {
        let record = extract_line(PETALBOT);
        assert_eq!(record.ip.as_deref(), Some("114.119.128.158"));
        assert_eq!(record.datetime.as_deref(), Some("06/Aug/2024:00:00:15 +0000"));
        assert_eq!(record.request_type.as_deref(), Some("GET"));
        assert_eq!(record.request.as_deref(), Some("/pfaf/BlagdonWilderness.php"));
        assert_eq!(record.status.as_deref(), Some("200"));
        assert_eq!(record.size.as_deref(), Some("9473"));
        assert_eq!(record.referrer.as_deref(), Some("https://singsurf.org/index.html"));
        assert_eq!(
            record.user_agent.as_deref(),
            Some(
                "Mozilla/5.0 (Linux; Android 7.0;) AppleWebKit/537.36 (KHTML, like Gecko) Mobile Safari/537.36 (compatible; PetalBot;+https://webmaster.petalsearch.com/site/petalbot)"
            )
        );
    }

    #[test]
    fn test_extract_bingbot_line() {
        let record = extract_line(BINGBOT);
        assert_eq!(record.ip.as_deref(), Some("207.46.13.125"));
        assert_eq!(
            record.request.as_deref(),
            Some("/wallpaper/wallpaper.php?FILENAME=06-14-12(184120).png")
        );
        assert_eq!(record.status.as_deref(), Some("200"));
        assert_eq!(record.size.as_deref(), Some("8383"));
        assert_eq!(record.referrer.as_deref(), Some("-"));
        assert!(record.is_complete());
    }

    #[test]
    fn test_missing_user_agent_keeps_other_fields() {
        let line = r#"10.0.0.1 - - [06/Aug/2024:01:02:03 +0000] "POST /api/upload HTTP/1.1" 413 - "-""#;
        let record = extract_line(line);

        assert_eq!(record.user_agent, None);
        assert_eq!(record.ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(record.datetime.as_deref(), Some("06/Aug/2024:01:02:03 +0000"));
        assert_eq!(record.request_type.as_deref(), Some("POST"));
        assert_eq!(record.request.as_deref(), Some("/api/upload"));
        assert_eq!(record.status.as_deref(), Some("413"));
        assert_eq!(record.size.as_deref(), Some("-"));
        assert_eq!(record.referrer.as_deref(), Some("-"));
    }

    #[test]
    fn test_empty_user_agent_is_absent() {
        let line = r#"10.0.0.4 - - [06/Aug/2024:01:02:03 +0000] "GET / HTTP/1.1" 200 5 "-" """#;
        let record = extract_line(line);

        assert_eq!(record.user_agent, None);
        assert_eq!(record.referrer.as_deref(), Some("-"));
        assert_eq!(record.size.as_deref(), Some("5"));
    }

    #[test]
    fn test_garbage_line_yields_empty_record() {
        assert_eq!(extract_line("not an access log line"), LogRecord::default());
        assert_eq!(extract_line(""), LogRecord::default());
    }

    #[test]
    fn test_unknown_method_is_absent() {
        let line = r#"10.0.0.2 - - [06/Aug/2024:01:02:03 +0000] "BREW /pot HTTP/1.1" 418 12 "-" "teapot""#;
        let record = extract_line(line);

        assert_eq!(record.request_type, None);
        assert_eq!(record.request, None);
        assert_eq!(record.status.as_deref(), Some("418"));
        assert_eq!(record.size.as_deref(), Some("12"));
        assert_eq!(record.user_agent.as_deref(), Some("teapot"));
    }

    #[test]
    fn test_ip_must_start_the_line() {
        let line = r#" 10.0.0.3 - - [06/Aug/2024:01:02:03 +0000] "GET / HTTP/1.1" 200 1 "-" "x""#;
        assert_eq!(extract_line(line).ip, None);
        assert_eq!(extract_line("10.0.0.3000 - -").ip, None);
    }

    #[test]
    fn test_extract_preserves_order_and_count() {
        let raw = RawLogFile::from_lines(vec![
            BINGBOT.to_string(),
            "junk".to_string(),
            PETALBOT.to_string(),
        ]);
        let table = extract(&raw);

        assert_eq!(table.len(), raw.len());
        assert_eq!(
            table.column(Field::Ip),
            vec![Some("207.46.13.125"), None, Some("114.119.128.158")]
        );
    }

    #[test]
    fn test_extract_is_deterministic() {
        let raw = RawLogFile::from_lines(vec![PETALBOT.to_string(), BINGBOT.to_string()]);
        assert_eq!(extract(&raw), extract(&raw));
    }
}
