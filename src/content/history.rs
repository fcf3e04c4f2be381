use super::{Dated, HistoryBucket};
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeSet, HashMap};

/// 按发布年月归档，最近的在前。
///
/// 先把日期按自然日去重并降序排列，再按 (年, 月) 相邻去重得到桶的顺序；
/// 每个桶的计数取自完整输入（不去重）。调用方负责事先过滤掉未发布文章，
/// 否则未发布文章会计入与已发布文章同月的桶。
pub fn aggregate_history<P: Dated>(posts: &[P]) -> Vec<HistoryBucket> {
    let days: Vec<NaiveDate> = posts.iter().map(|p| p.date().date_naive()).collect();

    let mut per_month: HashMap<(i32, u32), usize> = HashMap::new();
    for day in &days {
        *per_month.entry((day.year(), day.month0())).or_default() += 1;
    }

    let distinct: BTreeSet<NaiveDate> = days.into_iter().collect();

    let mut buckets: Vec<HistoryBucket> = Vec::new();
    for day in distinct.into_iter().rev() {
        let key = (day.year(), day.month0());
        if buckets.last().is_some_and(|b| (b.year, b.month) == key) {
            continue;
        }
        buckets.push(HistoryBucket {
            month: key.1,
            year: key.0,
            count: per_month.get(&key).copied().unwrap_or_default(),
        });
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Post;
    use crate::content::fixtures::post;

    fn bucket(month: u32, year: i32, count: usize) -> HistoryBucket {
        HistoryBucket { month, year, count }
    }

    #[test]
    fn empty_input_yields_no_buckets() {
        let posts: Vec<Post> = Vec::new();
        assert!(aggregate_history(&posts).is_empty());
    }

    #[test]
    fn buckets_sorted_most_recent_first() {
        let mut inactive = post(7, "Post 7", "tag7", "Category 7", (2012, 1, 1));
        inactive.active = false;
        let all = vec![
            post(1, "Post 1", "tag1", "Category 1", (2022, 1, 1)),
            post(2, "Post 2", "tag2", "Category 2", (2022, 1, 8)),
            post(3, "Post 3", "tag3", "Category 3", (2022, 1, 7)),
            post(4, "Post 4", "tag4", "Category 4", (2020, 3, 7)),
            post(5, "Post 5", "tag5", "Category 5", (2020, 4, 7)),
            post(6, "Post 6", "tag6", "Category 6", (2024, 5, 7)),
            inactive,
        ];
        let active: Vec<Post> = all.into_iter().filter(|p| p.active).collect();

        assert_eq!(
            aggregate_history(&active),
            vec![
                bucket(4, 2024, 1),
                bucket(0, 2022, 3),
                bucket(3, 2020, 1),
                bucket(2, 2020, 1),
            ]
        );
    }

    #[test]
    fn same_day_posts_count_individually() {
        let mut a = post(1, "a", "", "c", (2023, 6, 1));
        let b = post(2, "b", "", "c", (2023, 6, 1));
        // 同一天不同时刻视为同一个自然日
        a.date += chrono::Duration::hours(5);
        assert_eq!(aggregate_history(&[a, b]), vec![bucket(5, 2023, 2)]);
    }

    #[test]
    fn unfiltered_inactive_posts_inflate_shared_month() {
        let mut hidden = post(2, "b", "", "c", (2023, 6, 20));
        hidden.active = false;
        let posts = vec![post(1, "a", "", "c", (2023, 6, 1)), hidden];
        assert_eq!(aggregate_history(&posts), vec![bucket(5, 2023, 2)]);
    }
}
