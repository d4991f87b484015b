// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 文本归一化模块
///
/// 各来源共用的薪资、日期、地点、公司规模和描述文本解析。
/// 无法识别的输入只会让对应字段留空，不视为错误。
pub mod company_size;
pub mod dates;
pub mod location;
pub mod salary;
pub mod text;

pub use company_size::{classify_company_size, company_size_from_stage};
pub use dates::{parse_posted_date, parse_posted_date_at, posted_within_bucket};
pub use location::classify_location;
pub use salary::parse_salary;
pub use text::{clean_description, collapse_whitespace, employment_type, extract_requirements};
