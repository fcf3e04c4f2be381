use super::{Categorized, NameCount};

/// 分类聚合：按分类名原文（区分大小写，不去空白）分组计数。
///
/// 先对输入引用做稳定排序，再对相邻相同分类合并，输出因此按名称升序。
/// 与标签不同，这里刻意不做大小写归一。
pub fn aggregate_categories<P: Categorized>(posts: &[P]) -> Vec<NameCount> {
    let mut sorted: Vec<&str> = posts.iter().map(Categorized::category).collect();
    sorted.sort();

    let mut result: Vec<NameCount> = Vec::new();
    for category in sorted {
        match result.last_mut() {
            Some(last) if last.name == category => last.count += 1,
            _ => result.push(NameCount {
                name: category.to_string(),
                count: 1,
            }),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Cat(&'static str);

    impl Categorized for Cat {
        fn category(&self) -> &str {
            self.0
        }
    }

    fn pairs(result: &[NameCount]) -> Vec<(&str, usize)> {
        result.iter().map(|c| (c.name.as_str(), c.count)).collect()
    }

    #[test]
    fn groups_and_sorts_by_name() {
        let posts = [Cat("React"), Cat("Node"), Cat("React"), Cat("Mongo")];
        assert_eq!(
            pairs(&aggregate_categories(&posts)),
            vec![("Mongo", 1), ("Node", 1), ("React", 2)]
        );
    }

    #[test]
    fn case_and_whitespace_are_significant() {
        let posts = [Cat("node"), Cat("Node"), Cat("Node "), Cat("Node")];
        assert_eq!(
            pairs(&aggregate_categories(&posts)),
            vec![("Node", 2), ("Node ", 1), ("node", 1)]
        );
    }

    #[test]
    fn output_is_permutation_invariant() {
        let a = [Cat("b"), Cat("a"), Cat("c"), Cat("a")];
        let b = [Cat("a"), Cat("c"), Cat("a"), Cat("b")];
        assert_eq!(aggregate_categories(&a), aggregate_categories(&b));
    }

    #[test]
    fn empty_input() {
        let posts: [Cat; 0] = [];
        assert!(aggregate_categories(&posts).is_empty());
    }
}
