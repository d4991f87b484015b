// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::JobSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// 抓取任务实体
///
/// 表示一次可能跨多个来源的异步抓取请求，用于向调用方报告整体进度。
/// 状态只能单向流转，进入终态后不可再变更。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeTask {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 搜索关键词
    pub keywords: String,
    /// 地点过滤
    pub location: Option<String>,
    /// 请求的来源
    pub sources: Vec<JobSource>,
    /// 当前状态
    pub status: ScrapeStatus,
    /// 找到的职位数
    pub jobs_found: usize,
    /// 失败时的错误信息
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// 抓取任务状态
///
/// Queued → InProgress → Completed/Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeStatus {
    /// 已入队
    #[default]
    Queued,
    /// 执行中
    InProgress,
    /// 已完成
    Completed,
    /// 已失败
    Failed,
}

impl fmt::Display for ScrapeStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScrapeStatus::Queued => write!(f, "queued"),
            ScrapeStatus::InProgress => write!(f, "in_progress"),
            ScrapeStatus::Completed => write!(f, "completed"),
            ScrapeStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for ScrapeStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(ScrapeStatus::Queued),
            "in_progress" => Ok(ScrapeStatus::InProgress),
            "completed" => Ok(ScrapeStatus::Completed),
            "failed" => Ok(ScrapeStatus::Failed),
            _ => Err(()),
        }
    }
}

/// 领域错误类型
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    /// 无效的状态转换
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: ScrapeStatus, to: ScrapeStatus },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl ScrapeTask {
    /// 创建一个新的抓取任务
    ///
    /// 关键词为空或未指定任何来源时返回验证错误
    pub fn new(
        keywords: impl Into<String>,
        location: Option<String>,
        sources: Vec<JobSource>,
    ) -> Result<Self, DomainError> {
        let keywords = keywords.into();
        if keywords.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "keywords must not be empty".to_string(),
            ));
        }
        if sources.is_empty() {
            return Err(DomainError::ValidationError(
                "at least one source is required".to_string(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            keywords,
            location,
            sources,
            status: ScrapeStatus::Queued,
            jobs_found: 0,
            error: None,
            started_at: None,
            finished_at: None,
            created_at: Utc::now(),
        })
    }

    /// 启动任务
    ///
    /// 将任务状态从 Queued 变更为 InProgress
    pub fn start(mut self) -> Result<Self, DomainError> {
        match self.status {
            ScrapeStatus::Queued => {
                self.status = ScrapeStatus::InProgress;
                self.started_at = Some(Utc::now());
                Ok(self)
            }
            from => Err(DomainError::InvalidStateTransition {
                from,
                to: ScrapeStatus::InProgress,
            }),
        }
    }

    /// 完成任务并记录找到的职位数
    pub fn complete(mut self, jobs_found: usize) -> Result<Self, DomainError> {
        match self.status {
            ScrapeStatus::InProgress => {
                self.status = ScrapeStatus::Completed;
                self.jobs_found = jobs_found;
                self.finished_at = Some(Utc::now());
                Ok(self)
            }
            from => Err(DomainError::InvalidStateTransition {
                from,
                to: ScrapeStatus::Completed,
            }),
        }
    }

    /// 标记任务失败
    pub fn fail(mut self, error: impl Into<String>) -> Result<Self, DomainError> {
        match self.status {
            ScrapeStatus::InProgress => {
                self.status = ScrapeStatus::Failed;
                self.error = Some(error.into());
                self.finished_at = Some(Utc::now());
                Ok(self)
            }
            from => Err(DomainError::InvalidStateTransition {
                from,
                to: ScrapeStatus::Failed,
            }),
        }
    }

    /// 是否处于终态
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, ScrapeStatus::Completed | ScrapeStatus::Failed)
    }
}
