// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 职位来源枚举
///
/// 标识职位数据抓取自哪个外部招聘网站，同时作为抓取器注册表的键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobSource {
    /// Indeed
    Indeed,
    /// LinkedIn
    #[serde(rename = "linkedin")]
    LinkedIn,
    /// Dice（技术岗位）
    Dice,
    /// Wellfound（原 AngelList，初创公司）
    Wellfound,
    /// Y Combinator Work at a Startup
    #[serde(rename = "ycombinator")]
    YCombinator,
    /// Built In
    ///
    /// 已知但没有实现抓取器：请求它的任务会在报告中得到失败结果，
    /// 而不是被当作未知来源拒绝
    #[serde(rename = "builtin")]
    BuiltIn,
}

impl JobSource {
    /// 所有已知来源
    pub const ALL: [JobSource; 6] = [
        JobSource::Indeed,
        JobSource::LinkedIn,
        JobSource::Dice,
        JobSource::Wellfound,
        JobSource::YCombinator,
        JobSource::BuiltIn,
    ];

    /// 获取来源的规范名称
    pub fn as_str(&self) -> &'static str {
        match self {
            JobSource::Indeed => "indeed",
            JobSource::LinkedIn => "linkedin",
            JobSource::Dice => "dice",
            JobSource::Wellfound => "wellfound",
            JobSource::YCombinator => "ycombinator",
            JobSource::BuiltIn => "builtin",
        }
    }
}

impl fmt::Display for JobSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "indeed" => Ok(JobSource::Indeed),
            "linkedin" => Ok(JobSource::LinkedIn),
            "dice" => Ok(JobSource::Dice),
            "wellfound" | "angellist" => Ok(JobSource::Wellfound),
            "ycombinator" | "yc" | "workatastartup" => Ok(JobSource::YCombinator),
            "builtin" => Ok(JobSource::BuiltIn),
            other => Err(format!("unknown job source: {other}")),
        }
    }
}

/// 工作地点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    Remote,
    Hybrid,
    #[default]
    Onsite,
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LocationType::Remote => write!(f, "remote"),
            LocationType::Hybrid => write!(f, "hybrid"),
            LocationType::Onsite => write!(f, "onsite"),
        }
    }
}

/// 公司规模分级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompanySize {
    Startup,
    Small,
    Medium,
    Large,
    Enterprise,
}

/// 公司信息
///
/// 由引用它的职位持有，本引擎不做去重（持久层按名称归一化）。
/// 名称为空字符串表示未知。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Company {
    /// 公司名称
    pub name: String,
    /// 外部主页链接（例如招聘站上的公司页）
    pub profile_url: Option<String>,
    /// 公司规模
    pub size: Option<CompanySize>,
    /// 评分
    pub rating: Option<f32>,
    /// Logo 地址
    pub logo_url: Option<String>,
    /// 官网
    pub website: Option<String>,
    /// 行业
    pub industry: Option<String>,
}

impl Company {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// 薪资范围
///
/// 金额均为年化后的整数值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Salary {
    /// 最低薪资
    pub min: i64,
    /// 最高薪资（仅给出单个数值时为空）
    pub max: Option<i64>,
    /// 货币代码，默认 USD
    pub currency: String,
}

/// 职位实体
///
/// 抓取器在解析时创建，创建后本引擎不再修改。标题为空的职位是无效的，
/// 因此只能通过 [`Job::new`] 构造。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// 抓取时分配的唯一标识
    pub id: Uuid,
    /// 规范的来源链接，下游的去重键（未知时为空字符串）
    pub url: String,
    /// 职位标题
    pub title: String,
    /// 公司
    pub company: Company,
    /// 原始地点文本
    pub location: String,
    /// 由地点文本推断的地点类型
    pub location_type: LocationType,
    /// 解析后的薪资
    pub salary: Option<Salary>,
    /// 原始薪资文本
    pub salary_text: Option<String>,
    /// 职位描述（列表页上为摘要）
    pub description: String,
    /// 技能 / 要求列表
    pub requirements: Vec<String>,
    /// 雇佣类型，如 full-time
    pub employment_type: Option<String>,
    /// 发布时间
    pub posted_at: Option<DateTime<Utc>>,
    /// 来源
    pub source: JobSource,
    /// 来源站点上的职位 ID
    pub external_id: Option<String>,
    /// 来源特有的附加信息（股权、YC 批次等）
    pub metadata: BTreeMap<String, String>,
    /// 是否有效
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// 创建一个新的职位
    ///
    /// 标题去除首尾空白后为空时返回 `None`
    pub fn new(source: JobSource, title: impl AsRef<str>) -> Option<Self> {
        let title = title.as_ref().trim();
        if title.is_empty() {
            return None;
        }

        let now = Utc::now();
        Some(Self {
            id: Uuid::new_v4(),
            url: String::new(),
            title: title.to_string(),
            company: Company::default(),
            location: String::new(),
            location_type: LocationType::default(),
            salary: None,
            salary_text: None,
            description: String::new(),
            requirements: Vec::new(),
            employment_type: None,
            posted_at: None,
            source,
            external_id: None,
            metadata: BTreeMap::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_requires_title() {
        assert!(Job::new(JobSource::Indeed, "").is_none());
        assert!(Job::new(JobSource::Indeed, "   \n").is_none());

        let job = Job::new(JobSource::Dice, "  Rust Engineer ").unwrap();
        assert_eq!(job.title, "Rust Engineer");
        assert_eq!(job.source, JobSource::Dice);
        assert!(job.is_active);
        assert_eq!(job.location_type, LocationType::Onsite);
        assert!(job.url.is_empty());
    }

    #[test]
    fn test_job_source_round_trip() {
        for source in JobSource::ALL {
            assert_eq!(source.as_str().parse::<JobSource>().unwrap(), source);
        }
        assert_eq!("YC".parse::<JobSource>().unwrap(), JobSource::YCombinator);
        assert!("monster".parse::<JobSource>().is_err());
    }

    #[test]
    fn test_job_source_serde_names() {
        let json = serde_json::to_string(&JobSource::LinkedIn).unwrap();
        assert_eq!(json, "\"linkedin\"");
        let json = serde_json::to_string(&JobSource::YCombinator).unwrap();
        assert_eq!(json, "\"ycombinator\"");
    }
}
