use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_FILE: &str = "twinpress.toml";

#[derive(Debug, Deserialize)]
pub struct SiteConfig {
    pub site: SiteInfo,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Deserialize)]
pub struct SiteInfo {
    pub title: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    /// 前台阅读端口
    #[serde(default = "default_web_port")]
    pub web_port: u16,
    /// 后台管理端口
    #[serde(default = "default_admin_port")]
    pub admin_port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_json: bool,
    #[serde(default = "default_database")]
    pub database: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_jwt_expires_in")]
    pub jwt_expires_in: String,
    #[serde(default = "default_session_name")]
    pub session_name: String,
}

/// S3 兼容对象存储，空字段回退到 AWS_* 环境变量
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    /// 自定义 endpoint（MinIO、R2 等），留空使用 AWS 虚拟主机风格地址
    #[serde(default)]
    pub endpoint: String,
    /// 公开访问前缀，留空时由 bucket 和 region 推导
    #[serde(default)]
    pub public_url: String,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: String,
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListingConfig {
    #[serde(default = "default_page_limit")]
    pub default_limit: u32,
    #[serde(default = "default_max_limit")]
    pub max_limit: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct SeedConfig {
    /// 允许通过前台 /api/seed 重置示例数据，仅用于端到端测试
    #[serde(default)]
    pub enabled: bool,
}

impl SiteConfig {
    pub fn load(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join(CONFIG_FILE);
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("读取 {CONFIG_FILE} 失败：{}", e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut config: SiteConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("解析 {CONFIG_FILE} 失败：{}", e))?;
        config.storage.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }
}

impl StorageConfig {
    /// 配置文件未填写的字段从环境变量补齐
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let fields = [
            (&mut self.region, "AWS_REGION"),
            (&mut self.bucket, "AWS_BUCKET_NAME"),
            (&mut self.access_key_id, "AWS_ACCESS_KEY_ID"),
            (&mut self.secret_access_key, "AWS_SECRET_ACCESS_KEY"),
        ];
        for (field, key) in fields {
            if field.is_empty()
                && let Some(value) = lookup(key)
            {
                *field = value;
            }
        }
        if self.region.is_empty() {
            self.region = default_region();
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.bucket.is_empty() && !self.access_key_id.is_empty() && !self.secret_access_key.is_empty()
    }
}

// 默认值函数
fn default_host() -> String { "127.0.0.1".into() }
fn default_web_port() -> u16 { 3000 }
fn default_admin_port() -> u16 { 3001 }
fn default_log_level() -> String { "info".into() }
fn default_database() -> String { "twinpress.db".into() }
fn default_jwt_secret() -> String { "CHANGE_ME_IN_PRODUCTION".into() }
fn default_jwt_expires_in() -> String { "7d".into() }
fn default_session_name() -> String { "auth_token".into() }
fn default_region() -> String { "ap-southeast-2".into() }
fn default_max_file_size() -> String { "10MB".into() }
fn default_allowed_extensions() -> Vec<String> {
    vec!["jpg".into(), "jpeg".into(), "png".into(), "gif".into()]
}
fn default_page_limit() -> u32 { crate::content::pagination::DEFAULT_PAGE_LIMIT }
fn default_max_limit() -> u32 { 50 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            web_port: default_web_port(),
            admin_port: default_admin_port(),
            log_level: default_log_level(),
            log_json: false,
            database: default_database(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_expires_in: default_jwt_expires_in(),
            session_name: default_session_name(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            region: String::new(),
            bucket: String::new(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            endpoint: String::new(),
            public_url: String::new(),
            max_file_size: default_max_file_size(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_limit: default_page_limit(),
            max_limit: default_max_limit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_fills_defaults() {
        let config = SiteConfig::parse("[site]\ntitle = \"Blog\"\n").unwrap();
        assert_eq!(config.server.web_port, 3000);
        assert_eq!(config.server.admin_port, 3001);
        assert_eq!(config.auth.session_name, "auth_token");
        assert_eq!(config.listing.default_limit, 5);
        assert_eq!(config.storage.allowed_extensions, vec!["jpg", "jpeg", "png", "gif"]);
        assert!(!config.seed.enabled);
    }

    #[test]
    fn missing_site_section_is_an_error() {
        assert!(SiteConfig::parse("[server]\nweb_port = 8080\n").is_err());
    }

    #[test]
    fn env_only_fills_blank_storage_fields() {
        let mut storage = StorageConfig {
            bucket: "from-file".into(),
            ..Default::default()
        };
        storage.apply_env(|key| match key {
            "AWS_BUCKET_NAME" => Some("from-env".into()),
            "AWS_ACCESS_KEY_ID" => Some("AKIA".into()),
            _ => None,
        });
        assert_eq!(storage.bucket, "from-file");
        assert_eq!(storage.access_key_id, "AKIA");
        assert_eq!(storage.region, "ap-southeast-2");
        assert!(!storage.is_configured());
    }
}
