//! 行映射与时间值的统一表示
//!
//! due 在库中存储为固定宽度的 RFC3339 UTC 文本（微秒精度、Z 后缀），
//! 字典序即时间序，claim 的 `due <= now` 可以直接在 SQL 里做文本比较。

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;
use taskman_domain::{Category, Task, TaskmanError, TaskmanResult};

/// 把时刻编码为入库文本
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// 解析库中的时刻文本
pub fn parse_instant(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}

pub fn row_to_task(row: &sqlx::sqlite::SqliteRow) -> TaskmanResult<Task> {
    let id: i64 = row.try_get("id")?;
    let due_raw: Option<String> = row.try_get("due")?;
    let due = match due_raw {
        Some(raw) => Some(parse_instant(&raw).map_err(|_| TaskmanError::MalformedDue {
            id,
            value: raw,
        })?),
        None => None,
    };

    Ok(Task {
        id,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        due,
        priority: row.try_get("priority")?,
        category_id: row.try_get("category_id")?,
        notify_enabled: row.try_get("notify_enabled")?,
        notified: row.try_get("notified")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub fn row_to_category(row: &sqlx::sqlite::SqliteRow) -> TaskmanResult<Category> {
    Ok(Category {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_instant_round_trip() {
        let instant = Utc.with_ymd_and_hms(2025, 10, 9, 14, 30, 0).unwrap();
        let encoded = format_instant(instant);
        assert_eq!(parse_instant(&encoded).unwrap(), instant);
    }

    #[test]
    fn test_lexicographic_order_matches_chronological() {
        let earlier = Utc.with_ymd_and_hms(2025, 10, 9, 14, 30, 0).unwrap();
        let later = earlier + chrono::Duration::microseconds(1);
        assert!(format_instant(earlier) < format_instant(later));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_instant("amanhã às dez").is_err());
        assert!(parse_instant("2025-10-09").is_err());
    }
}
