//! 文章快照与派生视图。
//!
//! 这里的函数全部是纯函数：输入是调用方传入的文章快照，输出是聚合结果，
//! 不读取任何全局状态，也不做 I/O。存储访问由 `repository` 负责。

pub mod categories;
pub mod filter;
pub mod history;
pub mod navigation;
pub mod pagination;
pub mod slug;
pub mod tags;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 存储层返回的文章快照，聚合期间视为不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub url_id: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub image_url: String,
    pub category: String,
    /// 逗号分隔的标签原文，读取时才拆分
    pub tags: String,
    pub date: DateTime<Utc>,
    pub views: i64,
    /// 来自 likes 关联表的计数
    pub likes: i64,
    pub active: bool,
}

/// 名称 + 计数，用于分类和标签聚合
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameCount {
    pub name: String,
    pub count: usize,
}

/// 按年月归档的聚合桶，`month` 从 0 开始
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistoryBucket {
    pub month: u32,
    pub year: i32,
    pub count: usize,
}

pub trait Tagged {
    fn tags(&self) -> &str;

    /// 拆分、去空白、转小写后的标签，丢弃空项
    fn tag_labels(&self) -> impl Iterator<Item = String> + '_ {
        self.tags()
            .split(',')
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
    }
}

pub trait Categorized {
    fn category(&self) -> &str;
}

pub trait Dated {
    fn date(&self) -> DateTime<Utc>;
}

pub trait Searchable {
    fn title(&self) -> &str;
    fn description(&self) -> &str;
    fn content(&self) -> &str;
}

impl Tagged for Post {
    fn tags(&self) -> &str {
        &self.tags
    }
}

impl Categorized for Post {
    fn category(&self) -> &str {
        &self.category
    }
}

impl Dated for Post {
    fn date(&self) -> DateTime<Utc> {
        self.date
    }
}

impl Searchable for Post {
    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn content(&self) -> &str {
        &self.content
    }
}
