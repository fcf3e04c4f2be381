use anyhow::Result;
use sqlx::SqlitePool;

/// 点赞关联表：(post_id, source) 唯一，计数永远取关联行数
#[derive(Clone)]
pub struct LikeRepository {
    db: SqlitePool,
}

impl LikeRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// 切换点赞状态，返回切换后是否为“已点赞”
    pub async fn toggle(&self, post_id: i64, source: &str) -> Result<bool> {
        let mut tx = self.db.begin().await?;

        let removed = sqlx::query("DELETE FROM likes WHERE post_id = ? AND source = ?")
            .bind(post_id)
            .bind(source)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed == 0 {
            let now = chrono::Utc::now().to_rfc3339();
            sqlx::query("INSERT INTO likes (post_id, source, created_at) VALUES (?, ?, ?)")
                .bind(post_id)
                .bind(source)
                .bind(&now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(removed == 0)
    }

    pub async fn count(&self, post_id: i64) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM likes WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }
}
