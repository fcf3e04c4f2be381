use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_LIMIT: u32 = 5;

/// 无限滚动的分页请求，`page` 从 0 开始
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

/// 查询串中的原始分页参数，缺省值由站点配置决定
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageParams {
    pub fn resolve(self, default_limit: u32, max_limit: u32) -> PageRequest {
        PageRequest {
            page: self.page.unwrap_or(0),
            limit: self.limit.unwrap_or(default_limit),
        }
        .clamped(max_limit)
    }
}

impl PageRequest {
    /// 把 `limit` 限制在 `1..=max_limit`
    pub fn clamped(self, max_limit: u32) -> Self {
        Self {
            page: self.page,
            limit: self.limit.clamp(1, max_limit.max(1)),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.limit)
    }

    pub fn has_more(&self, total: u64) -> bool {
        (u64::from(self.page) + 1) * u64::from(self.limit) < total
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub posts: Vec<T>,
    pub total_posts: u64,
    pub has_more: bool,
}

impl<T> Page<T> {
    /// `posts` 应当已经是 `request` 对应的那一页
    pub fn new(posts: Vec<T>, total_posts: u64, request: &PageRequest) -> Self {
        Self {
            posts,
            total_posts,
            has_more: request.has_more(total_posts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(page: u32, limit: u32) -> PageRequest {
        PageRequest { page, limit }
    }

    #[test]
    fn twelve_posts_five_per_page() {
        assert_eq!(req(0, 5).offset(), 0);
        assert!(req(0, 5).has_more(12));
        assert_eq!(req(2, 5).offset(), 10);
        assert!(!req(2, 5).has_more(12));
        assert!(!req(3, 5).has_more(12));
    }

    #[test]
    fn consecutive_pages_cover_everything_once() {
        let total = 23u64;
        let mut covered = 0;
        let mut page = 0;
        loop {
            let r = req(page, 4);
            assert_eq!(r.offset(), covered);
            covered = (covered + u64::from(r.limit)).min(total);
            if !r.has_more(total) {
                break;
            }
            page += 1;
        }
        assert_eq!(covered, total);
        assert_eq!(page, 5);
    }

    #[test]
    fn missing_params_use_configured_default() {
        let params: PageParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.resolve(5, 50), req(0, 5));
        let params: PageParams = serde_json::from_str(r#"{"page":2}"#).unwrap();
        assert_eq!(params.resolve(10, 50), req(2, 10));
        let params: PageParams = serde_json::from_str(r#"{"limit":3}"#).unwrap();
        assert_eq!(params.resolve(10, 50), req(0, 3));
    }

    #[test]
    fn clamp_keeps_limit_positive() {
        assert_eq!(req(1, 0).clamped(50).limit, 1);
        assert_eq!(req(1, 500).clamped(50).limit, 50);
        assert_eq!(req(1, 7).clamped(50), req(1, 7));
        assert_eq!(PageParams::default().resolve(80, 50).limit, 50);
    }

    #[test]
    fn huge_page_does_not_overflow() {
        let r = req(u32::MAX, u32::MAX);
        assert_eq!(r.offset(), u64::from(u32::MAX) * u64::from(u32::MAX));
        assert!(!r.has_more(3));
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let p = Page::new(vec![1], 12, &req(0, 5));
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["totalPosts"], 12);
        assert_eq!(v["hasMore"], true);
    }
}
