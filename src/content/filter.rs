//! 列表页的过滤与排序。
//!
//! 多个过滤条件之间是“与”的关系。格式不对的过滤条件直接视为未设置，
//! 永远不会报错，也不会修改输入。

use super::{Dated, Searchable, Tagged};
use chrono::{Months, NaiveDate};
use serde::Deserialize;
use std::cmp::Ordering;
use std::str::FromStr;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostFilter {
    /// 在标题、摘要、正文中做不区分大小写的子串匹配
    #[serde(default)]
    pub text: Option<String>,
    /// 与任意一个标签做不区分大小写的子串匹配
    #[serde(default)]
    pub tag: Option<String>,
    /// `DDMMYYYY`，保留该日期（含）之后的文章
    #[serde(default)]
    pub min_date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    TitleAsc,
    TitleDesc,
    DateAsc,
    DateDesc,
}

impl FromStr for SortKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title-asc" => Ok(Self::TitleAsc),
            "title-desc" => Ok(Self::TitleDesc),
            "date-asc" => Ok(Self::DateAsc),
            "date-desc" => Ok(Self::DateDesc),
            _ => Err(()),
        }
    }
}

impl SortKey {
    /// 无法识别的排序键返回 `None`，等同于不排序
    pub fn parse(s: Option<&str>) -> Option<Self> {
        s.and_then(|s| s.parse().ok())
    }
}

/// 解析 `DDMMYYYY`。
///
/// 长度不是 8 或包含非数字时返回 `None`。日、月超出范围时按日历进位
/// （例如 `32012024` 是 2024-02-01，`00012024` 是 2023-12-31），
/// 与前端日期输入的行为一致。
pub fn parse_min_date(raw: &str) -> Option<NaiveDate> {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let day: i64 = raw[0..2].parse().ok()?;
    let month: i64 = raw[2..4].parse().ok()?;
    let year: i64 = raw[4..8].parse().ok()?;

    // 月份从 0 起算后按 12 进位，日从当月 1 号偏移
    let months_total = year * 12 + (month - 1);
    let y = i32::try_from(months_total.div_euclid(12)).ok()?;
    let m = u32::try_from(months_total.rem_euclid(12)).ok()? + 1;

    let first = NaiveDate::from_ymd_opt(y, m, 1)?;
    first.checked_add_signed(chrono::Duration::days(day - 1))
}

/// 过滤并排序，返回输入元素的引用，原集合保持不变
pub fn filter_and_sort<'a, P>(posts: &'a [P], filter: &PostFilter, sort: Option<SortKey>) -> Vec<&'a P>
where
    P: Searchable + Tagged + Dated,
{
    let text = non_empty_lower(filter.text.as_deref());
    let tag = non_empty_lower(filter.tag.as_deref());
    let min_date = filter.min_date.as_deref().and_then(parse_min_date);

    let mut result: Vec<&P> = posts
        .iter()
        .filter(|p| text.as_deref().is_none_or(|t| matches_text(*p, t)))
        .filter(|p| tag.as_deref().is_none_or(|t| matches_tag(*p, t)))
        .filter(|p| min_date.is_none_or(|d| p.date().date_naive() >= d))
        .collect();

    if let Some(key) = sort {
        // sort_by 是稳定排序
        result.sort_by(|a, b| compare(key, *a, *b));
    }
    result
}

fn non_empty_lower(s: Option<&str>) -> Option<String> {
    s.filter(|s| !s.is_empty()).map(str::to_lowercase)
}

fn matches_text<P: Searchable>(post: &P, needle: &str) -> bool {
    [post.title(), post.description(), post.content()]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

fn matches_tag<P: Tagged>(post: &P, needle: &str) -> bool {
    post.tag_labels().any(|label| label.contains(needle))
}

fn compare<P: Searchable + Dated>(key: SortKey, a: &P, b: &P) -> Ordering {
    match key {
        SortKey::TitleAsc => locale_cmp(a.title(), b.title()),
        SortKey::TitleDesc => locale_cmp(b.title(), a.title()),
        SortKey::DateAsc => a.date().cmp(&b.date()),
        SortKey::DateDesc => b.date().cmp(&a.date()),
    }
}

/// 近似按人类阅读习惯比较：先忽略大小写，相同时小写在前
fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// 按月份的起止日期判断是否落在某年某月，`month` 从 1 开始
pub fn in_month<P: Dated>(post: &P, year: i32, month: u32) -> bool {
    let Some(start) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return false;
    };
    let Some(end) = start.checked_add_months(Months::new(1)) else {
        return false;
    };
    let day = post.date().date_naive();
    day >= start && day < end
}
