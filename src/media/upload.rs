use crate::config::StorageConfig;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("No file provided")]
    Missing,
    #[error("Invalid file type. Only {allowed} files are allowed.")]
    InvalidType { allowed: String },
    #[error("File size {size} exceeds limit {limit}")]
    TooLarge { size: String, limit: String },
}

pub fn parse_max_size(size_str: &str) -> usize {
    let s = size_str.trim().to_uppercase();

    let (num_part, multiplier) = if let Some(n) = s.strip_suffix("GB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("KB") {
        (n, 1024)
    } else if let Some(n) = s.strip_suffix('B') {
        (n, 1)
    } else {
        (s.as_str(), 1)
    };

    num_part.trim().parse::<usize>().unwrap_or(0) * multiplier
}

pub fn format_size(bytes: usize) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1}MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1}KB", bytes as f64 / 1024.0)
    } else {
        format!("{}B", bytes)
    }
}

/// 校验文件名后缀与大小，返回小写后缀
pub fn validate_upload(file_name: &str, size: usize, config: &StorageConfig) -> Result<String, UploadError> {
    if file_name.is_empty() || size == 0 {
        return Err(UploadError::Missing);
    }

    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    if ext.is_empty() || !config.allowed_extensions.iter().any(|a| a.eq_ignore_ascii_case(&ext)) {
        return Err(UploadError::InvalidType {
            allowed: config.allowed_extensions.join(", ").to_uppercase(),
        });
    }

    let max_size = parse_max_size(&config.max_file_size);
    if size > max_size {
        return Err(UploadError::TooLarge {
            size: format_size(size),
            limit: config.max_file_size.clone(),
        });
    }

    Ok(ext)
}

/// 对象键：`<ulid>.<ext>`
pub fn object_key(ext: &str) -> String {
    format!("{}.{ext}", ulid::Ulid::new().to_string().to_lowercase())
}

pub fn content_type_for(ext: &str) -> &'static str {
    match ext {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
