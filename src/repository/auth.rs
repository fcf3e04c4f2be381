use super::post::format_date;
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// 登录校验所需的账号字段
#[derive(Debug, sqlx::FromRow)]
pub struct Credentials {
    pub id: String,
    pub password_hash: String,
}

/// 后台账号与会话撤销记录
#[derive(Clone)]
pub struct AuthRepository {
    db: SqlitePool,
}

impl AuthRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn credentials(&self, username: &str) -> Result<Option<Credentials>> {
        let row = sqlx::query_as::<_, Credentials>("SELECT id, password_hash FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    pub async fn touch_last_login(&self, user_id: &str) -> Result<()> {
        sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
            .bind(format_date(&Utc::now()))
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// 创建账号，用户名已存在时只重置密码
    pub async fn upsert_user(&self, username: &str, password_hash: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, username, password_hash, created_at) VALUES (?, ?, ?, ?) \
             ON CONFLICT(username) DO UPDATE SET password_hash = excluded.password_hash",
        )
        .bind(ulid::Ulid::new().to_string())
        .bind(username)
        .bind(password_hash)
        .bind(format_date(&Utc::now()))
        .execute(&self.db)
        .await?;
        Ok(())
    }

    pub async fn has_users(&self) -> bool {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users)")
            .fetch_one(&self.db)
            .await
            .unwrap_or(false)
    }

    /// 登出后 token 在自然过期前一直保留在撤销表中
    pub async fn revoke(&self, jti: &str, expires_at: DateTime<Utc>) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO revoked_tokens (jti, expires_at) VALUES (?, ?)")
            .bind(jti)
            .bind(format_date(&expires_at))
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// 查询失败按已撤销处理
    pub async fn is_revoked(&self, jti: &str) -> bool {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE jti = ?)")
            .bind(jti)
            .fetch_one(&self.db)
            .await
            .unwrap_or(true)
    }

    /// 删除 `now` 之前已经过期的撤销记录，返回删除条数
    pub async fn purge_revoked(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < ?")
            .bind(format_date(&now))
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }
}
