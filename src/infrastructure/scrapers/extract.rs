// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::normalize::collapse_whitespace;
use regex::Regex;
use std::collections::HashSet;
use scraper::node::Node;
use scraper::{ElementRef, Selector};
use tracing::warn;
use url::{ParseError, Url};

/// 有序的选择器策略链
///
/// 站点改版时主选择器常会失效，因此每个提取点都按顺序尝试多个策略，
/// 第一个产出结果的策略生效。
#[derive(Debug, Clone)]
pub struct SelectorChain {
    label: &'static str,
    selectors: Vec<Selector>,
}

impl SelectorChain {
    /// 创建策略链，无法解析的选择器会被跳过并记录警告
    pub fn new(label: &'static str, strategies: &[&str]) -> Self {
        let selectors = strategies
            .iter()
            .filter_map(|css| match Selector::parse(css) {
                Ok(selector) => Some(selector),
                Err(e) => {
                    warn!("Skipping invalid selector {:?} for {}: {}", css, label, e);
                    None
                }
            })
            .collect();
        Self { label, selectors }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// 第一个有匹配的策略的全部元素
    pub fn select_all<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        self.selectors
            .iter()
            .map(|selector| scope.select(selector).collect::<Vec<_>>())
            .find(|found| !found.is_empty())
            .unwrap_or_default()
    }

    /// 与 [`select_all`](Self::select_all) 相同，但去掉嵌套在其它匹配内部的元素
    ///
    /// 子串类名选择器（如 `[class*='job-card']`）也会命中 `job-card-title` 这类子元素
    pub fn select_outermost<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        let found = self.select_all(scope);
        let ids: HashSet<_> = found.iter().map(|el| el.id()).collect();
        found
            .into_iter()
            .filter(|el| !el.ancestors().any(|ancestor| ids.contains(&ancestor.id())))
            .collect()
    }

    /// 第一个匹配的元素
    pub fn first<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.selectors
            .iter()
            .find_map(|selector| scope.select(selector).next())
    }

    /// 第一个非空文本
    pub fn first_text(&self, scope: ElementRef<'_>) -> Option<String> {
        self.selectors.iter().find_map(|selector| {
            scope
                .select(selector)
                .map(element_text)
                .find(|text| !text.is_empty())
        })
    }

    /// 第一个非空属性值
    pub fn first_attr(&self, scope: ElementRef<'_>, attr: &str) -> Option<String> {
        self.selectors.iter().find_map(|selector| {
            scope
                .select(selector)
                .filter_map(|el| el.value().attr(attr))
                .map(str::trim)
                .find(|value| !value.is_empty())
                .map(str::to_string)
        })
    }

    /// 第一个有结果的策略下所有非空文本
    pub fn all_texts(&self, scope: ElementRef<'_>) -> Vec<String> {
        self.select_all(scope)
            .into_iter()
            .map(element_text)
            .filter(|text| !text.is_empty())
            .collect()
    }
}

/// 元素的文本（空白已合并）
pub fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// 保留段落和列表结构的文本
///
/// 块级元素之间换行，列表项前加 `- `，便于后续提取要求列表
pub fn block_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    write_block_text(element, &mut out);
    out.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn write_block_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                let block = is_block(name);
                if block || name == "br" {
                    out.push('\n');
                }
                if name == "li" {
                    out.push_str("- ");
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    write_block_text(child_el, out);
                }
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

fn is_block(name: &str) -> bool {
    matches!(
        name,
        "p" | "div"
            | "li"
            | "ul"
            | "ol"
            | "section"
            | "article"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "tr"
            | "table"
    )
}

/// 将可能为相对路径的链接解析为绝对地址
pub fn resolve_url(base: &Url, href: &str) -> Result<Url, ParseError> {
    base.join(href.trim())
}

/// 规范化职位链接
///
/// `strip_query` 为真时去掉查询参数（例如 LinkedIn 的跟踪参数）；片段总会被去除
pub fn canonical_url(base: &Url, href: &str, strip_query: bool) -> Result<String, ParseError> {
    let mut url = resolve_url(base, href)?;
    if strip_query {
        url.set_query(None);
    }
    url.set_fragment(None);
    Ok(url.to_string())
}

/// 用来源特有的模式从 URL 中提取外部 ID
pub fn capture_id(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
