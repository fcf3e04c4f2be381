//! 由标题派生文章的 `url_id`。
//!
//! 派生规则：转小写，把每段连续的 `[a-z0-9]` 以外字符替换为单个连字符，
//! 去掉首尾连字符。结果不足 3 个字符时改用 `post--<ulid>` 兜底；
//! 派生结果里不会出现连续连字符，所以兜底值不会与任何标题的派生结果相撞。
//!
//! 唯一性检查由调用方注入，占用时依次尝试 `-1`、`-2`……
//! 这里的检查只是建议性的（先查后写），最终以数据库唯一索引为准。

use regex::Regex;
use std::future::Future;
use std::sync::LazyLock;

const MIN_SLUG_LEN: usize = 3;
const FALLBACK_PREFIX: &str = "post--";

static NON_SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("slug regex"));

/// 存储层提供的唯一性查询
pub trait SlugLookup {
    type Error;

    /// `candidate` 是否已被 `exclude_id` 以外的文章占用
    fn is_taken(
        &self,
        candidate: &str,
        exclude_id: Option<i64>,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;
}

/// 纯派生：不做唯一性检查，可能返回空串
pub fn normalize(title: &str) -> String {
    let lower = title.to_lowercase();
    NON_SLUG_RE
        .replace_all(&lower, "-")
        .trim_matches('-')
        .to_string()
}

/// 派生基础 slug，过短时使用兜底值
pub fn derive_base(title: &str) -> String {
    let slug = normalize(title);
    if slug.len() < MIN_SLUG_LEN {
        fallback_slug()
    } else {
        slug
    }
}

fn fallback_slug() -> String {
    format!(
        "{FALLBACK_PREFIX}{}",
        ulid::Ulid::new().to_string().to_lowercase()
    )
}

/// 依次产出 `base`、`base-1`、`base-2`……
fn candidates(base: String) -> impl Iterator<Item = String> {
    std::iter::once(base.clone()).chain((1u64..).map(move |n| format!("{base}-{n}")))
}

/// 同步版本：`is_taken` 返回 `Err` 时原样向上传递
pub fn generate_slug<F, E>(title: &str, exclude_id: Option<i64>, mut is_taken: F) -> Result<String, E>
where
    F: FnMut(&str, Option<i64>) -> Result<bool, E>,
{
    for candidate in candidates(derive_base(title)) {
        if !is_taken(&candidate, exclude_id)? {
            return Ok(candidate);
        }
    }
    unreachable!("candidate sequence is unbounded")
}

/// 异步版本，供后台创建/更新文章时查询数据库
pub async fn generate_slug_with<L>(
    title: &str,
    exclude_id: Option<i64>,
    lookup: &L,
) -> Result<String, L::Error>
where
    L: SlugLookup + Sync,
{
    for candidate in candidates(derive_base(title)) {
        if !lookup.is_taken(&candidate, exclude_id).await? {
            return Ok(candidate);
        }
    }
    unreachable!("candidate sequence is unbounded")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::convert::Infallible;

    fn never_taken(_: &str, _: Option<i64>) -> Result<bool, Infallible> {
        Ok(false)
    }

    #[test]
    fn derives_lowercase_hyphenated_slug() {
        let slug = generate_slug("My Post!!", None, never_taken).unwrap();
        assert_eq!(slug, "my-post");
    }

    #[test]
    fn collapses_runs_and_strips_edges() {
        assert_eq!(normalize("  --Hello,   World__2024--  "), "hello-world-2024");
        assert_eq!(normalize("Café Crème"), "caf-cr-me");
    }

    #[test]
    fn appends_counter_on_collision() {
        let slug = generate_slug("My Post!!", None, |c, _| Ok::<_, Infallible>(c == "my-post")).unwrap();
        assert_eq!(slug, "my-post-1");
    }

    #[test]
    fn keeps_counting_until_free() {
        let taken: HashSet<&str> = ["rust", "rust-1", "rust-2"].into_iter().collect();
        let mut calls = 0;
        let slug = generate_slug("Rust", None, |c, _| {
            calls += 1;
            Ok::<_, Infallible>(taken.contains(c))
        })
        .unwrap();
        assert_eq!(slug, "rust-3");
        assert_eq!(calls, 4);
    }

    #[test]
    fn short_or_empty_titles_use_fallback() {
        for title in ["", "   ", "!!", "ab", "é"] {
            let slug = generate_slug(title, None, never_taken).unwrap();
            assert!(slug.starts_with("post--"), "{title:?} -> {slug}");
            assert!(slug.len() > MIN_SLUG_LEN);
        }
    }

    #[test]
    fn fallback_never_matches_a_derived_slug() {
        let fallback = derive_base("");
        assert_ne!(normalize(&fallback), fallback);
    }

    #[test]
    fn exclude_id_is_forwarded() {
        let slug = generate_slug("Same Title", Some(42), |c, exclude| {
            // 自己那一行不算占用
            Ok::<_, Infallible>(c == "same-title" && exclude != Some(42))
        })
        .unwrap();
        assert_eq!(slug, "same-title");
    }

    #[test]
    fn lookup_error_propagates() {
        let result = generate_slug("Anything", None, |_, _| Err("db down"));
        assert_eq!(result, Err("db down"));
    }

    struct Registry(HashSet<String>);

    impl SlugLookup for Registry {
        type Error = Infallible;

        async fn is_taken(&self, candidate: &str, _exclude_id: Option<i64>) -> Result<bool, Infallible> {
            Ok(self.0.contains(candidate))
        }
    }

    #[tokio::test]
    async fn async_lookup_matches_sync_behavior() {
        let registry = Registry(["hello-world".to_string()].into_iter().collect());
        let slug = generate_slug_with("Hello, World", None, &registry).await.unwrap();
        assert_eq!(slug, "hello-world-1");
    }
}
