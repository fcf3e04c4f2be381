use crate::config::CONFIG_FILE;
use anyhow::Result;
use std::fs;
use std::path::Path;

// 默认 twinpress.toml
const DEFAULT_CONFIG: &str = r#"[site]
title = "My Blog"
url = "http://127.0.0.1:3000"

[server]
host = "127.0.0.1"
web_port = 3000
admin_port = 3001
log_level = "info"
database = "twinpress.db"

[auth]
jwt_expires_in = "7d"
session_name = "auth_token"

[storage]
# 留空时读取 AWS_REGION / AWS_BUCKET_NAME / AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY
region = ""
bucket = ""
max_file_size = "10MB"

[listing]
default_limit = 5
max_limit = 50

[seed]
enabled = false
"#;

/// 检测项目是否已初始化，未初始化则写入默认配置。
/// 返回 `true` 表示执行了初始化，`false` 表示已存在。
pub fn ensure_initialized(root: &Path) -> Result<bool> {
    let config_path = root.join(CONFIG_FILE);
    if config_path.exists() {
        return Ok(false);
    }

    fs::create_dir_all(root)?;
    fs::write(&config_path, DEFAULT_CONFIG)?;
    tracing::info!("已写入默认配置：{}", config_path.display());
    Ok(true)
}
