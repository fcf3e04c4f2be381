use super::categories::aggregate_categories;
use super::history::aggregate_history;
use super::tags::aggregate_tags;
use super::{Categorized, Dated, HistoryBucket, NameCount, Searchable, Tagged};
use serde::Serialize;

/// 侧边栏导航中的一个链接
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub name: String,
    pub count: usize,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryLink {
    pub month: u32,
    pub year: i32,
    pub count: usize,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub categories: Vec<NavLink>,
    pub tags: Vec<NavLink>,
    pub history: Vec<HistoryLink>,
}

/// 路由中使用的键：转小写，空格换成连字符
pub fn route_key(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// 分类路由命中：两边都按路由键比较
pub fn in_category<P: Categorized>(post: &P, key: &str) -> bool {
    route_key(post.category()) == route_key(key)
}

/// 标签路由命中：任意一个标签的路由键与 `key` 相同
pub fn has_tag<P: Tagged>(post: &P, key: &str) -> bool {
    let key = route_key(key);
    post.tag_labels().any(|label| route_key(&label) == key)
}

/// 搜索页：标题或摘要包含查询词（不区分大小写），空查询命中全部
pub fn matches_query<P: Searchable>(post: &P, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    query.is_empty()
        || post.title().to_lowercase().contains(&query)
        || post.description().to_lowercase().contains(&query)
}

/// 对同一份快照计算三种聚合并附上链接
pub fn build_navigation<P>(posts: &[P]) -> Navigation
where
    P: Categorized + Tagged + Dated,
{
    Navigation {
        categories: links("/category", aggregate_categories(posts)),
        tags: links("/tags", aggregate_tags(posts)),
        history: aggregate_history(posts).into_iter().map(history_link).collect(),
    }
}

fn links(prefix: &str, items: Vec<NameCount>) -> Vec<NavLink> {
    items
        .into_iter()
        .map(|item| NavLink {
            href: format!("{prefix}/{}", route_key(&item.name)),
            name: item.name,
            count: item.count,
        })
        .collect()
}

fn history_link(bucket: HistoryBucket) -> HistoryLink {
    HistoryLink {
        month: bucket.month,
        year: bucket.year,
        count: bucket.count,
        href: format!("/history/{}/{}", bucket.year, bucket.month + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::fixtures::post;

    #[test]
    fn route_key_lowercases_and_hyphenates() {
        assert_eq!(route_key("Machine Learning"), "machine-learning");
        assert_eq!(route_key("node"), "node");
    }

    #[test]
    fn navigation_links_encode_keys() {
        let posts = vec![
            post(1, "a", "Web Dev,Rust", "Dev Ops", (2024, 2, 10)),
            post(2, "b", "rust", "Node", (2023, 12, 1)),
        ];
        let nav = build_navigation(&posts);

        assert_eq!(nav.categories[0].href, "/category/dev-ops");
        assert_eq!(nav.categories[1].href, "/category/node");
        assert_eq!(nav.tags[0].name, "rust");
        assert_eq!(nav.tags[0].count, 2);
        assert_eq!(nav.tags[1].href, "/tags/web-dev");
        assert_eq!(nav.history[0].href, "/history/2024/2");
        assert_eq!(nav.history[1].href, "/history/2023/12");
    }

    #[test]
    fn route_matchers_use_keys() {
        let p = post(1, "Intro to Axum", "Web Dev, rust", "Dev Ops", (2024, 1, 1));

        assert!(in_category(&p, "dev-ops"));
        assert!(in_category(&p, "Dev Ops"));
        assert!(!in_category(&p, "dev"));

        assert!(has_tag(&p, "web-dev"));
        assert!(has_tag(&p, "RUST"));
        assert!(!has_tag(&p, "web"));
    }

    #[test]
    fn query_matches_title_or_description_only() {
        let mut p = post(1, "Intro to Axum", "", "", (2024, 1, 1));
        p.description = "Routing basics".into();
        p.content = "tower layers".into();

        assert!(matches_query(&p, "  AXUM "));
        assert!(matches_query(&p, "routing"));
        assert!(!matches_query(&p, "tower"));
        assert!(matches_query(&p, "   "));
    }
}
