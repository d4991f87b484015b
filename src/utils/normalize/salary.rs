// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::Salary;
use once_cell::sync::Lazy;
use regex::Regex;

/// 年工作小时数，用于时薪年化
pub const HOURS_PER_YEAR: f64 = 2080.0;

const AMOUNT: &str = r"(?:C\$|CA\$|\$|£|€)\s*([0-9][0-9,]*(?:\.[0-9]+)?)\s*([kK])?";

static RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"{AMOUNT}\s*(?:[–—-]|to)\s*{AMOUNT}")).unwrap()
});

static SINGLE: Lazy<Regex> = Lazy::new(|| Regex::new(AMOUNT).unwrap());

/// 解析薪资文本
///
/// 支持 `$100K – $150K`、`$120,000 - $150,000 a year`、`$25 - $30 an hour`
/// 以及单个金额。无法识别时返回 `None`。
pub fn parse_salary(text: &str) -> Option<Salary> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let multiplier = if is_hourly(text) { HOURS_PER_YEAR } else { 1.0 };
    let currency = detect_currency(text).to_string();

    if let Some(caps) = RANGE.captures(text) {
        let matched = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
        let thousands = if matched.contains(['K', 'k']) { 1000.0 } else { 1.0 };
        let min = amount(caps.get(1)?.as_str())? * thousands * multiplier;
        let max = amount(caps.get(3)?.as_str())? * thousands * multiplier;
        return Some(Salary {
            min: min.round() as i64,
            max: Some(max.round() as i64),
            currency,
        });
    }

    let caps = SINGLE.captures(text)?;
    let thousands = if caps.get(2).is_some() { 1000.0 } else { 1.0 };
    let min = amount(caps.get(1)?.as_str())? * thousands * multiplier;
    Some(Salary {
        min: min.round() as i64,
        max: None,
        currency,
    })
}

fn amount(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}

fn is_hourly(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("hour") || lower.contains("/hr") || lower.contains("per hr")
}

/// 识别货币，默认 USD
pub fn detect_currency(text: &str) -> &'static str {
    let upper = text.to_uppercase();
    if upper.contains('£') || upper.contains("GBP") {
        "GBP"
    } else if upper.contains('€') || upper.contains("EUR") {
        "EUR"
    } else if upper.contains("CAD") || upper.contains("C$") {
        "CAD"
    } else {
        "USD"
    }
}
