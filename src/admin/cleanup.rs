use crate::repository::AuthRepository;
use std::time::Duration;

const PURGE_INTERVAL: Duration = Duration::from_secs(3600);

/// 每小时清理一次已过期的撤销 token，首次在启动时立即执行
pub fn spawn_token_cleanup(auth: AuthRepository) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            match auth.purge_revoked(chrono::Utc::now()).await {
                Ok(0) => {}
                Ok(rows) => tracing::info!("已清理 {} 条过期 token 记录", rows),
                Err(e) => tracing::warn!("清理 revoked_tokens 失败: {e}"),
            }
        }
    })
}
