use super::{NameCount, Tagged};
use std::collections::BTreeMap;

/// 标签聚合：按字典序升序，计数为去重前的出现次数。
///
/// 是否只统计已发布文章由调用方决定。
pub fn aggregate_tags<P: Tagged>(posts: &[P]) -> Vec<NameCount> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for label in posts.iter().flat_map(Tagged::tag_labels) {
        *counts.entry(label).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|(name, count)| NameCount { name, count })
        .collect()
}
