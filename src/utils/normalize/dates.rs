// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

static RELATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)\+?\s*(minute|min|hour|hr|day|week|month)s?\b").unwrap()
});

const NOW_MARKERS: [&str; 5] = ["just posted", "just now", "today", "moments ago", "few seconds"];

const ABSOLUTE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y"];

/// 解析发布时间文本（相对或绝对），以当前时间为基准
pub fn parse_posted_date(text: &str) -> Option<DateTime<Utc>> {
    parse_posted_date_at(text, Utc::now())
}

/// 以给定时间为基准解析发布时间文本
///
/// 无法识别的文本返回 `None` 而不是错误
pub fn parse_posted_date_at(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_lowercase();

    if NOW_MARKERS.iter().any(|m| lower.contains(m)) {
        return Some(now);
    }
    if lower.contains("yesterday") {
        return Some(now - ChronoDuration::days(1));
    }

    if let Some(caps) = RELATIVE.captures(&lower) {
        let n: i64 = caps.get(1)?.as_str().parse().ok()?;
        // 页面上的数字不可信，溢出时视为无法识别
        let delta = match caps.get(2)?.as_str() {
            "minute" | "min" => ChronoDuration::try_minutes(n),
            "hour" | "hr" => ChronoDuration::try_hours(n),
            "day" => ChronoDuration::try_days(n),
            "week" => ChronoDuration::try_weeks(n),
            "month" => n.checked_mul(30).and_then(ChronoDuration::try_days),
            _ => None,
        }?;
        return now.checked_sub_signed(delta);
    }

    parse_absolute(trimmed)
}

fn parse_absolute(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    ABSOLUTE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// 将发布时间窗口映射到站点支持的时间桶
///
/// 选择不小于窗口的最小桶；窗口超过最大桶时不加过滤
pub fn posted_within_bucket<T: Copy>(window: Duration, buckets: &[(Duration, T)]) -> Option<T> {
    buckets
        .iter()
        .filter(|(limit, _)| window <= *limit)
        .min_by_key(|(limit, _)| *limit)
        .map(|(_, value)| *value)
}

/// 天数转换为 `Duration`，过大的值饱和
pub const fn days(n: u64) -> Duration {
    Duration::from_secs(n.saturating_mul(24 * 60 * 60))
}
