use crate::content::Post;
use crate::content::slug::SlugLookup;
use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;

/// 创建/更新文章时由调用方提供的字段
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub category: String,
    /// 发布时间，缺省为当前时间
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

const SELECT_POST: &str = "SELECT p.id, p.url_id, p.title, p.description, p.content, p.image_url, \
     p.category, p.tags, p.date, p.views, p.active, \
     (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS likes \
     FROM posts p";

/// 统一的“最新在前”顺序，id 作为同一时间的决胜键，保证翻页稳定
const NEWEST_FIRST: &str = "ORDER BY p.date DESC, p.id DESC";

/// 日期以固定宽度的 RFC 3339 文本存储，字典序即时间序
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// 写入是否因为 url_id 唯一索引冲突而失败
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|e| e.is_unique_violation())
}

#[derive(Clone)]
pub struct PostRepository {
    db: SqlitePool,
}

impl PostRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// 后台使用：包含未发布文章
    pub async fn list_all(&self) -> Result<Vec<Post>> {
        let sql = format!("{SELECT_POST} {NEWEST_FIRST}");
        let posts = sqlx::query_as::<_, Post>(&sql).fetch_all(&self.db).await?;
        Ok(posts)
    }

    pub async fn list_active(&self) -> Result<Vec<Post>> {
        let sql = format!("{SELECT_POST} WHERE p.active = 1 {NEWEST_FIRST}");
        let posts = sqlx::query_as::<_, Post>(&sql).fetch_all(&self.db).await?;
        Ok(posts)
    }

    pub async fn count_active(&self) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts WHERE active = 1")
            .fetch_one(&self.db)
            .await?;
        Ok(count.max(0) as u64)
    }

    /// 无限滚动：已发布文章的一页
    pub async fn page_active(&self, offset: u64, limit: u32) -> Result<Vec<Post>> {
        let sql = format!("{SELECT_POST} WHERE p.active = 1 {NEWEST_FIRST} LIMIT ? OFFSET ?");
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        let posts = sqlx::query_as::<_, Post>(&sql)
            .bind(i64::from(limit))
            .bind(offset)
            .fetch_all(&self.db)
            .await?;
        Ok(posts)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Post>> {
        let sql = format!("{SELECT_POST} WHERE p.id = ?");
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(post)
    }

    pub async fn find_by_url_id(&self, url_id: &str) -> Result<Option<Post>> {
        let sql = format!("{SELECT_POST} WHERE p.url_id = ?");
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(url_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(post)
    }

    /// `candidate` 是否已被 `exclude_id` 以外的文章占用
    pub async fn url_id_taken(&self, candidate: &str, exclude_id: Option<i64>) -> Result<bool> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM posts WHERE url_id = ? AND (? IS NULL OR id != ?))",
        )
        .bind(candidate)
        .bind(exclude_id)
        .bind(exclude_id)
        .fetch_one(&self.db)
        .await?;
        Ok(taken)
    }

    pub async fn create(&self, input: &PostInput, url_id: &str) -> Result<Post> {
        let date = format_date(&input.date.unwrap_or_else(Utc::now));

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO posts (url_id, title, description, content, image_url, category, tags, date, views, active) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, 1) RETURNING id",
        )
        .bind(url_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.content)
        .bind(&input.image_url)
        .bind(&input.category)
        .bind(&input.tags)
        .bind(&date)
        .fetch_one(&self.db)
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("新建文章 {id} 读取失败"))
    }

    /// 更新内容字段；`date` 为空时保留原发布时间
    pub async fn update(&self, id: i64, input: &PostInput, url_id: &str) -> Result<Option<Post>> {
        let date = input.date.as_ref().map(format_date);

        let result = sqlx::query(
            "UPDATE posts SET url_id = ?, title = ?, description = ?, content = ?, image_url = ?, \
             category = ?, tags = ?, date = COALESCE(?, date) WHERE id = ?",
        )
        .bind(url_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.content)
        .bind(&input.image_url)
        .bind(&input.category)
        .bind(&input.tags)
        .bind(date)
        .bind(id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    pub async fn set_active(&self, id: i64, active: bool) -> Result<Option<Post>> {
        let result = sqlx::query("UPDATE posts SET active = ? WHERE id = ?")
            .bind(active)
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    /// 先删点赞再删文章，返回被删除的文章
    pub async fn delete(&self, id: i64) -> Result<Option<Post>> {
        let Some(post) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let mut tx = self.db.begin().await?;
        sqlx::query("DELETE FROM likes WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok((result.rows_affected() > 0).then_some(post))
    }

    /// 阅读量加一，返回新的阅读量
    pub async fn increment_views(&self, id: i64) -> Result<Option<i64>> {
        let views: Option<i64> =
            sqlx::query_scalar("UPDATE posts SET views = views + 1 WHERE id = ? RETURNING views")
                .bind(id)
                .fetch_optional(&self.db)
                .await?;
        Ok(views)
    }

    pub async fn views(&self, id: i64) -> Result<Option<i64>> {
        let views: Option<i64> = sqlx::query_scalar("SELECT views FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(views)
    }

    /// 清空全部文章与点赞后写入给定数据（示例数据重置）
    pub async fn replace_all(&self, posts: &[(String, PostInput)]) -> Result<usize> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM likes").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM posts").execute(&mut *tx).await?;

        for (url_id, input) in posts {
            let date = format_date(&input.date.unwrap_or_else(Utc::now));
            sqlx::query(
                "INSERT INTO posts (url_id, title, description, content, image_url, category, tags, date, views, active) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, 1)",
            )
            .bind(url_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.content)
            .bind(&input.image_url)
            .bind(&input.category)
            .bind(&input.tags)
            .bind(&date)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(posts.len())
    }
}

impl SlugLookup for PostRepository {
    type Error = anyhow::Error;

    async fn is_taken(&self, candidate: &str, exclude_id: Option<i64>) -> Result<bool> {
        self.url_id_taken(candidate, exclude_id).await
    }
}
