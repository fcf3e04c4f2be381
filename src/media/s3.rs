//! S3 兼容存储的 PutObject，签名算法为 AWS Signature Version 4。

use crate::config::StorageConfig;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Url;
use sha2::{Digest, Sha256};
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";

#[derive(Debug, Error)]
pub enum S3Error {
    #[error("对象存储未配置：缺少 {0}")]
    NotConfigured(&'static str),
    #[error("对象存储地址无效：{0}")]
    InvalidEndpoint(String),
    #[error("签名失败")]
    Signing,
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("对象存储拒绝请求（{status}）：{body}")]
    Rejected { status: u16, body: String },
}

/// 已签名的 PUT 请求
#[derive(Debug)]
pub struct SignedPut {
    pub url: Url,
    pub headers: Vec<(&'static str, String)>,
}

#[derive(Clone)]
pub struct S3Client {
    config: StorageConfig,
    http: reqwest::Client,
}

impl S3Client {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// 上传对象，返回公开访问 URL
    pub async fn put_object(&self, key: &str, content_type: &str, body: Vec<u8>) -> Result<String, S3Error> {
        let signed = sign_put(&self.config, key, &body, Utc::now())?;

        let mut request = self
            .http
            .put(signed.url)
            .header("content-type", content_type);
        for (name, value) in signed.headers {
            request = request.header(name, value);
        }

        let response = request.body(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(S3Error::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(key, "图片已上传到对象存储");
        Ok(public_url(&self.config, key))
    }
}

/// 对象的公开地址
pub fn public_url(config: &StorageConfig, key: &str) -> String {
    if !config.public_url.is_empty() {
        return format!("{}/{key}", config.public_url.trim_end_matches('/'));
    }
    format!(
        "https://{}.s3.{}.amazonaws.com/{key}",
        config.bucket, config.region
    )
}

/// 构造并签名 PutObject 请求。未设置 endpoint 时使用虚拟主机风格，
/// 否则使用路径风格 `{endpoint}/{bucket}/{key}`。
pub fn sign_put(config: &StorageConfig, key: &str, body: &[u8], now: DateTime<Utc>) -> Result<SignedPut, S3Error> {
    if config.bucket.is_empty() {
        return Err(S3Error::NotConfigured("bucket"));
    }
    if config.access_key_id.is_empty() {
        return Err(S3Error::NotConfigured("access_key_id"));
    }
    if config.secret_access_key.is_empty() {
        return Err(S3Error::NotConfigured("secret_access_key"));
    }

    let raw_url = if config.endpoint.is_empty() {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            config.bucket,
            config.region,
            uri_encode_path(key)
        )
    } else {
        format!(
            "{}/{}/{}",
            config.endpoint.trim_end_matches('/'),
            uri_encode_path(&config.bucket),
            uri_encode_path(key)
        )
    };
    let url = Url::parse(&raw_url).map_err(|e| S3Error::InvalidEndpoint(e.to_string()))?;
    let host = match (url.host_str(), url.port()) {
        (Some(h), Some(p)) => format!("{h}:{p}"),
        (Some(h), None) => h.to_string(),
        (None, _) => return Err(S3Error::InvalidEndpoint(raw_url)),
    };

    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();
    let payload_hash = hex(&Sha256::digest(body));

    let canonical_request = format!(
        "PUT\n{path}\n\nhost:{host}\nx-amz-content-sha256:{payload_hash}\nx-amz-date:{amz_date}\n\n{SIGNED_HEADERS}\n{payload_hash}",
        path = url.path(),
    );

    let scope = format!("{date_stamp}/{}/s3/aws4_request", config.region);
    let string_to_sign = format!(
        "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
        hex(&Sha256::digest(canonical_request.as_bytes()))
    );

    let signing_key = signing_key(&config.secret_access_key, &date_stamp, &config.region, "s3")?;
    let signature = hex(&hmac(&signing_key, string_to_sign.as_bytes())?);

    let authorization = format!(
        "{ALGORITHM} Credential={}/{scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
        config.access_key_id
    );

    Ok(SignedPut {
        url,
        headers: vec![
            ("x-amz-date", amz_date),
            ("x-amz-content-sha256", payload_hash),
            ("authorization", authorization),
        ],
    })
}

fn signing_key(secret: &str, date_stamp: &str, region: &str, service: &str) -> Result<Vec<u8>, S3Error> {
    let k_date = hmac(format!("AWS4{secret}").as_bytes(), date_stamp.as_bytes())?;
    let k_region = hmac(&k_date, region.as_bytes())?;
    let k_service = hmac(&k_region, service.as_bytes())?;
    hmac(&k_service, b"aws4_request")
}

fn hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>, S3Error> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| S3Error::Signing)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// 路径分段编码：保留非保留字符和 `/`
fn uri_encode_path(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn config() -> StorageConfig {
        StorageConfig {
            region: "ap-southeast-2".into(),
            bucket: "images".into(),
            access_key_id: "AKIDEXAMPLE".into(),
            secret_access_key: "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".into(),
            ..Default::default()
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 7, 12, 30, 0).unwrap()
    }

    #[test]
    fn signing_key_matches_aws_example() {
        let key = signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20120215",
            "us-east-1",
            "iam",
        )
        .unwrap();
        assert_eq!(
            hex(&key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn virtual_host_request_is_signed() {
        let signed = sign_put(&config(), "abc.png", b"data", at()).unwrap();
        assert_eq!(
            signed.url.as_str(),
            "https://images.s3.ap-southeast-2.amazonaws.com/abc.png"
        );

        let auth = &signed.headers.iter().find(|(k, _)| *k == "authorization").unwrap().1;
        assert!(auth.starts_with(
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240507/ap-southeast-2/s3/aws4_request, \
             SignedHeaders=host;x-amz-content-sha256;x-amz-date, Signature="
        ));
        let signature = auth.rsplit('=').next().unwrap();
        assert_eq!(signature.len(), 64);

        let date = &signed.headers.iter().find(|(k, _)| *k == "x-amz-date").unwrap().1;
        assert_eq!(date, "20240507T123000Z");
    }

    #[test]
    fn signature_depends_on_body() {
        let a = sign_put(&config(), "k.png", b"one", at()).unwrap();
        let b = sign_put(&config(), "k.png", b"two", at()).unwrap();
        let again = sign_put(&config(), "k.png", b"one", at()).unwrap();
        assert_ne!(a.headers, b.headers);
        assert_eq!(a.headers, again.headers);
    }

    #[test]
    fn custom_endpoint_uses_path_style() {
        let cfg = StorageConfig {
            endpoint: "http://localhost:9000/".into(),
            ..config()
        };
        let signed = sign_put(&cfg, "a b.png", b"x", at()).unwrap();
        assert_eq!(signed.url.as_str(), "http://localhost:9000/images/a%20b.png");
    }

    #[test]
    fn missing_credentials_are_reported() {
        let cfg = StorageConfig {
            secret_access_key: String::new(),
            ..config()
        };
        assert!(matches!(
            sign_put(&cfg, "k", b"", at()),
            Err(S3Error::NotConfigured("secret_access_key"))
        ));
    }

    #[test]
    fn public_url_prefers_override() {
        let mut cfg = config();
        assert_eq!(
            public_url(&cfg, "k.png"),
            "https://images.s3.ap-southeast-2.amazonaws.com/k.png"
        );
        cfg.public_url = "https://cdn.example.com/".into();
        assert_eq!(public_url(&cfg, "k.png"), "https://cdn.example.com/k.png");
    }
}
