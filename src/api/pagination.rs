use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;
use crate::containers::LogEntry;

/// Raw `?cursor=&limit=` query. `limit` stays a string so a bad value falls
/// back to the default instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub cursor: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaginationOptions {
    pub limit: usize,
    pub cursor: Option<String>,
}

impl PaginationOptions {
    pub fn from_query(query: &PageQuery, config: &PaginationConfig) -> Self {
        let limit = query
            .limit
            .as_deref()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(config.default_limit)
            .min(config.max_limit);

        Self {
            limit,
            cursor: query.cursor.clone().filter(|c| !c.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogPage {
    pub meta: PageMeta,
    pub log: Vec<LogEntry>,
}

/// Page through a project's log buffer (oldest first).
///
/// With no cursor the newest `limit` entries are returned. A cursor `X`
/// returns entries after the one stamped `X`; `-X` returns the entries just
/// before it. An unknown cursor yields an empty page.
pub fn paginate_logs(logs: &[LogEntry], options: &PaginationOptions) -> LogPage {
    let limit = options.limit;
    let position = |ts: &str| logs.iter().position(|entry| entry.ts == ts);

    let range = match options.cursor.as_deref() {
        None => Some((logs.len().saturating_sub(limit), logs.len())),
        Some(cursor) => match cursor.strip_prefix('-') {
            Some(ts) => position(ts).map(|i| (i.saturating_sub(limit), i)),
            None => position(cursor).map(|i| (i + 1, (i + 1 + limit).min(logs.len()))),
        },
    };

    let (start, end) = range.unwrap_or((0, 0));
    let page = logs[start..end].to_vec();

    let meta = PageMeta {
        next_cursor: page.last().map(|entry| entry.ts.clone()),
        previous_cursor: page
            .first()
            .filter(|_| start > 0)
            .map(|entry| format!("-{}", entry.ts)),
    };

    LogPage { meta, log: page }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logs(count: usize) -> Vec<LogEntry> {
        (1..=count)
            .map(|i| LogEntry {
                ts: format!("{}", 1000 + i),
                level: "info".to_string(),
                msg: format!("line {}", i),
            })
            .collect()
    }

    fn options(limit: usize, cursor: Option<&str>) -> PaginationOptions {
        PaginationOptions {
            limit,
            cursor: cursor.map(str::to_string),
        }
    }

    fn stamps(page: &LogPage) -> Vec<&str> {
        page.log.iter().map(|e| e.ts.as_str()).collect()
    }

    #[test]
    fn no_cursor_returns_newest() {
        let page = paginate_logs(&logs(10), &options(3, None));
        assert_eq!(stamps(&page), ["1008", "1009", "1010"]);
        assert_eq!(page.meta.next_cursor.as_deref(), Some("1010"));
        assert_eq!(page.meta.previous_cursor.as_deref(), Some("-1008"));
    }

    #[test]
    fn forward_cursor_excludes_itself() {
        let page = paginate_logs(&logs(10), &options(3, Some("1002")));
        assert_eq!(stamps(&page), ["1003", "1004", "1005"]);

        let tail = paginate_logs(&logs(10), &options(30, Some("1009")));
        assert_eq!(stamps(&tail), ["1010"]);

        let nothing_newer = paginate_logs(&logs(10), &options(30, Some("1010")));
        assert!(nothing_newer.log.is_empty());
        assert_eq!(nothing_newer.meta, PageMeta::default());
    }

    #[test]
    fn backward_cursor_returns_preceding_entries() {
        let page = paginate_logs(&logs(10), &options(3, Some("-1008")));
        assert_eq!(stamps(&page), ["1005", "1006", "1007"]);
        assert_eq!(page.meta.previous_cursor.as_deref(), Some("-1005"));

        let head = paginate_logs(&logs(10), &options(3, Some("-1003")));
        assert_eq!(stamps(&head), ["1001", "1002"]);
        assert_eq!(head.meta.previous_cursor, None);
        assert_eq!(head.meta.next_cursor.as_deref(), Some("1002"));
    }

    #[test]
    fn unknown_cursor_is_empty() {
        assert!(paginate_logs(&logs(5), &options(3, Some("42"))).log.is_empty());
        assert!(paginate_logs(&logs(5), &options(3, Some("-42"))).log.is_empty());
    }

    #[test]
    fn whole_buffer_has_no_previous_cursor() {
        let page = paginate_logs(&logs(4), &options(30, None));
        assert_eq!(page.log.len(), 4);
        assert_eq!(page.meta.previous_cursor, None);
    }

    #[test]
    fn limit_parsing_falls_back_and_caps() {
        let config = PaginationConfig { default_limit: 30, max_limit: 100 };
        let parse = |limit: Option<&str>| {
            PaginationOptions::from_query(
                &PageQuery { cursor: None, limit: limit.map(str::to_string) },
                &config,
            )
            .limit
        };
        assert_eq!(parse(None), 30);
        assert_eq!(parse(Some("abc")), 30);
        assert_eq!(parse(Some("0")), 30);
        assert_eq!(parse(Some("5")), 5);
        assert_eq!(parse(Some("5000")), 100);
    }
}
