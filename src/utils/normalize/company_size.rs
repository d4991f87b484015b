// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::CompanySize;

// Largest first: "501-1000" also contains "1-10".
const SIZE_PATTERNS: [(CompanySize, &[&str]); 5] = [
    (
        CompanySize::Enterprise,
        &["10000", "5001", "5000", "1001", "1000+"],
    ),
    (CompanySize::Large, &["201-500", "501-1000", "201-1000", "500+"]),
    (CompanySize::Medium, &["51-200", "51-100", "101-200", "101-250"]),
    (CompanySize::Small, &["11-50", "11-20", "21-50", "10-50"]),
    (CompanySize::Startup, &["1-10", "2-10", "1-5", "1-9"]),
];

/// 根据员工人数区间推断公司规模
///
/// 无法识别时返回调用方给出的默认值
pub fn classify_company_size(text: &str, default: Option<CompanySize>) -> Option<CompanySize> {
    let normalized: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .map(|c| if c == '–' || c == '—' { '-' } else { c })
        .collect::<String>()
        .to_lowercase();

    if normalized.is_empty() {
        return default;
    }

    SIZE_PATTERNS
        .iter()
        .find(|(_, patterns)| patterns.iter().any(|p| normalized.contains(p)))
        .map(|(size, _)| *size)
        .or(default)
}

/// 根据融资阶段推断公司规模
pub fn company_size_from_stage(stage: &str) -> Option<CompanySize> {
    let lower = stage.to_lowercase();
    if lower.contains("seed") || lower.contains("early") || lower.contains("pre-series") {
        Some(CompanySize::Startup)
    } else if lower.contains("series a") || lower.contains("series b") {
        Some(CompanySize::Small)
    } else if lower.contains("series c")
        || lower.contains("series d")
        || lower.contains("growth")
    {
        Some(CompanySize::Medium)
    } else if lower.contains("public") || lower.contains("acquired") {
        Some(CompanySize::Large)
    } else {
        None
    }
}
