use axum::Json;
use axum::extract::{Multipart, State};
use serde_json::{Value, json};

use crate::error::{ApiError, ApiResult};
use crate::media::upload::{UploadError, content_type_for, object_key, validate_upload};
use crate::state::AppState;

/// multipart 中的 `image` 字段上传到对象存储，返回 `{imageUrl}`
pub async fn upload_image(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult<Json<Value>> {
    let mut image = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("读取上传内容失败：{e}")))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_owned();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("读取上传内容失败：{e}")))?;
        image = Some((file_name, data));
        break;
    }

    let (file_name, data) = image.ok_or(UploadError::Missing)?;
    let ext = validate_upload(&file_name, data.len(), state.storage.config())?;
    let key = object_key(&ext);

    let image_url = state
        .storage
        .put_object(&key, content_type_for(&ext), data.to_vec())
        .await?;

    tracing::info!(file = %file_name, %key, "图片上传完成");
    Ok(Json(json!({ "imageUrl": image_url })))
}
