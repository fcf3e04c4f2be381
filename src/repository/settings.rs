use anyhow::Result;
use sqlx::SqlitePool;

/// 键值形式的站点设置，目前只保存自动生成的 JWT 密钥
#[derive(Clone)]
pub struct SettingsRepository {
    db: SqlitePool,
}

impl SettingsRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM site_settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.db)
            .await?;
        Ok(value)
    }

    /// 键不存在时写入 `init()` 的结果；已存在则保留原值。返回最终保存的值
    pub async fn get_or_init<F>(&self, key: &str, init: F) -> Result<String>
    where
        F: FnOnce() -> String,
    {
        if let Some(value) = self.get(key).await? {
            return Ok(value);
        }

        let candidate = init();
        sqlx::query("INSERT INTO site_settings (key, value) VALUES (?, ?) ON CONFLICT(key) DO NOTHING")
            .bind(key)
            .bind(&candidate)
            .execute(&self.db)
            .await?;

        // 并发初始化时以先写入者为准
        self.get(key)
            .await?
            .ok_or_else(|| anyhow::anyhow!("设置项 {key} 写入后读取失败"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_pool;

    #[tokio::test]
    async fn init_runs_only_once() {
        let repo = SettingsRepository::new(test_pool().await);
        assert_eq!(repo.get("k").await.unwrap(), None);

        let first = repo.get_or_init("k", || "one".into()).await.unwrap();
        let second = repo
            .get_or_init("k", || panic!("already initialised"))
            .await
            .unwrap();

        assert_eq!(first, "one");
        assert_eq!(second, "one");
        assert_eq!(repo.get("k").await.unwrap().as_deref(), Some("one"));
    }
}
