// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;

/// 最多提取的要求条目数
pub const MAX_REQUIREMENTS: usize = 20;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"&[a-zA-Z]+;").unwrap());
static REQUIREMENT_SECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:requirements?|qualifications?|what you.?ll need|must haves?|skills?|technologies|tech stack)\b[^\n]*\n((?:[ \t]*[-•*][^\n]*(?:\n|$))+)",
    )
    .unwrap()
});
static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t]*[-•*]\s*(.+?)\s*$").unwrap());

const SKILL_KEYWORDS: [&str; 34] = [
    "Python", "JavaScript", "TypeScript", "Java", "C++", "C#", "Go", "Rust",
    "React", "Vue", "Angular", "Node.js", "Django", "FastAPI", "Flask",
    "AWS", "GCP", "Azure", "Docker", "Kubernetes", "Terraform",
    "PostgreSQL", "MySQL", "MongoDB", "Redis", "Elasticsearch",
    "Machine Learning", "Deep Learning", "NLP", "Computer Vision",
    "CI/CD", "Git", "Agile", "Scrum",
];

/// 合并连续空白并去除首尾空白
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// 清理描述文本：去除残留的 HTML 实体并合并空白
pub fn clean_description(text: &str) -> String {
    let without_entities = ENTITY.replace_all(text, " ");
    collapse_whitespace(&without_entities)
}

/// 从描述中提取要求 / 技能
///
/// 先取要求类标题下的列表项，再扫描常见技能关键词，去重后最多保留 20 条
pub fn extract_requirements(description: &str) -> Vec<String> {
    let mut requirements: Vec<String> = Vec::new();

    for section in REQUIREMENT_SECTION.captures_iter(description) {
        let Some(body) = section.get(1) else { continue };
        for bullet in BULLET.captures_iter(body.as_str()) {
            if let Some(item) = bullet.get(1) {
                let item = collapse_whitespace(item.as_str());
                if item.chars().count() > 3 {
                    push_unique(&mut requirements, item);
                }
            }
        }
    }

    let lower = description.to_lowercase();
    for skill in SKILL_KEYWORDS {
        if contains_term(&lower, &skill.to_lowercase()) {
            push_unique(&mut requirements, skill.to_string());
        }
    }

    requirements.truncate(MAX_REQUIREMENTS);
    requirements
}

/// 归一化雇佣类型
pub fn employment_type(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    let kind = if lower.contains("full-time") || lower.contains("full time") {
        "full-time"
    } else if lower.contains("part-time") || lower.contains("part time") {
        "part-time"
    } else if lower.contains("contract") {
        "contract"
    } else if lower.contains("intern") {
        "internship"
    } else if lower.contains("temporary") {
        "temporary"
    } else {
        return None;
    };
    Some(kind.to_string())
}

fn push_unique(out: &mut Vec<String>, item: String) {
    if !out.iter().any(|r| r.eq_ignore_ascii_case(&item)) {
        out.push(item);
    }
}

/// 按词边界查找（允许 `C++`、`Node.js` 这类带符号的词）
fn contains_term(haystack: &str, term: &str) -> bool {
    haystack.match_indices(term).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + term.len()..].chars().next();
        !before.is_some_and(|c| c.is_alphanumeric())
            && !after.is_some_and(|c| c.is_alphanumeric() || c == '+' || c == '#')
    })
}
