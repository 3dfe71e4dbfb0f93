//! Image hosting.
//!
//! Only the public URL of an uploaded image is ever stored; the bytes live
//! with whichever [`ImageHost`] is configured.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use aibuilders_common::{
    AppError, AppResult, IdGenerator,
    config::{MediaBackend, MediaConfig},
};
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

/// An image to upload.
#[derive(Debug, Clone)]
pub struct UploadImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub file_name: String,
}

/// Where an uploaded image can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedImage {
    pub url: String,
}

/// Image hosting backend.
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Store the image and return its public URL.
    async fn upload(&self, image: UploadImage) -> AppResult<HostedImage>;
}

/// Trim a user-supplied image URL. Blank means "no image".
///
/// Anything else must be an absolute `http` or `https` URL.
pub fn normalize_hosted_url(raw: &str) -> AppResult<Option<String>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let parsed =
        Url::parse(raw).map_err(|e| AppError::Validation(format!("Invalid image URL: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(Some(raw.to_string())),
        scheme => Err(AppError::Validation(format!(
            "Image URL must use http or https, not {scheme}"
        ))),
    }
}

/// Media service: checks uploads, then hands them to the image host.
#[derive(Clone)]
pub struct MediaService {
    host: Arc<dyn ImageHost>,
    max_upload_bytes: usize,
}

impl MediaService {
    /// Create a new media service.
    #[must_use]
    pub fn new(host: Arc<dyn ImageHost>, max_upload_bytes: usize) -> Self {
        Self {
            host,
            max_upload_bytes,
        }
    }

    /// Upload an image and return its public URL.
    pub async fn upload_image(&self, image: UploadImage) -> AppResult<HostedImage> {
        if !image.content_type.starts_with("image/") {
            return Err(AppError::Validation(format!(
                "Unsupported content type: {}",
                image.content_type
            )));
        }
        if image.bytes.is_empty() {
            return Err(AppError::Validation("Image is empty".to_string()));
        }
        if image.bytes.len() > self.max_upload_bytes {
            return Err(AppError::Validation(format!(
                "Image exceeds {} bytes",
                self.max_upload_bytes
            )));
        }

        let size = image.bytes.len();
        let hosted = self.host.upload(image).await?;
        tracing::info!(url = %hosted.url, size, "Image uploaded");
        Ok(hosted)
    }
}

/// Build the image host named by the configuration.
pub fn image_host_from_config(config: &MediaConfig) -> AppResult<Arc<dyn ImageHost>> {
    match config.backend {
        MediaBackend::Local => Ok(Arc::new(LocalImageHost::new(
            config.local_path.clone(),
            config.local_base_url.clone(),
        ))),
        MediaBackend::Cloudinary => {
            let cloud_name = config.cloudinary_cloud_name.as_deref().ok_or_else(|| {
                AppError::Config("media.cloudinary_cloud_name is required".to_string())
            })?;
            Ok(Arc::new(CloudinaryImageHost::new(
                &config.cloudinary_api_base,
                cloud_name,
                &config.cloudinary_upload_preset,
            )?))
        }
    }
}

/// Local filesystem image host.
pub struct LocalImageHost {
    base_path: PathBuf,
    base_url: String,
    id_gen: IdGenerator,
}

impl LocalImageHost {
    /// Create a new local image host.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self {
            base_path,
            base_url,
            id_gen: IdGenerator::new(),
        }
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/avif" => "avif",
        "image/svg+xml" => "svg",
        _ => "bin",
    }
}

#[async_trait]
impl ImageHost for LocalImageHost {
    async fn upload(&self, image: UploadImage) -> AppResult<HostedImage> {
        let key = format!(
            "{}.{}",
            self.id_gen.generate(),
            extension_for(&image.content_type)
        );

        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create directory: {e}")))?;

        tokio::fs::write(self.base_path.join(&key), &image.bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write file: {e}")))?;

        Ok(HostedImage {
            url: format!("{}/{key}", self.base_url.trim_end_matches('/')),
        })
    }
}

/// Cloudinary-compatible image host using unsigned uploads.
pub struct CloudinaryImageHost {
    client: reqwest::Client,
    endpoint: String,
    upload_preset: String,
}

#[derive(Debug, Deserialize)]
struct CloudinaryResponse {
    secure_url: Option<String>,
    error: Option<CloudinaryError>,
}

#[derive(Debug, Deserialize)]
struct CloudinaryError {
    message: String,
}

impl CloudinaryImageHost {
    /// Create a host that posts to `{api_base}/{cloud_name}/image/upload`.
    pub fn new(api_base: &str, cloud_name: &str, upload_preset: &str) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/{cloud_name}/image/upload",
                api_base.trim_end_matches('/')
            ),
            upload_preset: upload_preset.to_string(),
        })
    }

    /// Upload endpoint this host posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ImageHost for CloudinaryImageHost {
    async fn upload(&self, image: UploadImage) -> AppResult<HostedImage> {
        let part = reqwest::multipart::Part::bytes(image.bytes)
            .file_name(image.file_name)
            .mime_str(&image.content_type)
            .map_err(|e| AppError::Validation(format!("Invalid content type: {e}")))?;

        let form = reqwest::multipart::Form::new()
            .text("upload_preset", self.upload_preset.clone())
            .part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Image upload failed: {e}")))?;

        let status = response.status();
        let body: CloudinaryResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Invalid upload response: {e}")))?;

        match (body.secure_url, body.error) {
            (Some(url), _) if status.is_success() => Ok(HostedImage { url }),
            (_, Some(err)) => Err(AppError::ExternalService(format!(
                "Image host rejected upload ({status}): {}",
                err.message
            ))),
            _ => Err(AppError::ExternalService(format!(
                "Image host returned no URL ({status})"
            ))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingHost {
        uploads: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ImageHost for RecordingHost {
        async fn upload(&self, image: UploadImage) -> AppResult<HostedImage> {
            self.uploads.lock().unwrap().push(image.file_name.clone());
            Ok(HostedImage {
                url: format!("https://img.example/{}", image.file_name),
            })
        }
    }

    fn image(content_type: &str, size: usize) -> UploadImage {
        UploadImage {
            bytes: vec![0u8; size],
            content_type: content_type.to_string(),
            file_name: "cat.png".to_string(),
        }
    }

    #[test]
    fn test_normalize_hosted_url() {
        assert_eq!(normalize_hosted_url("   ").unwrap(), None);
        assert_eq!(
            normalize_hosted_url(" https://img.example/a.png ").unwrap(),
            Some("https://img.example/a.png".to_string())
        );
        assert!(matches!(
            normalize_hosted_url("ftp://img.example/a.png"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            normalize_hosted_url("not a url"),
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_upload_image_checks_content_type_and_size() {
        let host = Arc::new(RecordingHost::default());
        let media = MediaService::new(host.clone(), 16);

        assert!(matches!(
            media.upload_image(image("text/plain", 4)).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            media.upload_image(image("image/png", 17)).await,
            Err(AppError::Validation(_))
        ));
        assert!(host.uploads.lock().unwrap().is_empty());

        let hosted = media.upload_image(image("image/png", 16)).await.unwrap();
        assert_eq!(hosted.url, "https://img.example/cat.png");
        assert_eq!(host.uploads.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_local_host_writes_file() {
        let dir = std::env::temp_dir().join(format!(
            "aibuilders-media-{}",
            IdGenerator::new().generate()
        ));
        let host = LocalImageHost::new(dir.clone(), "/files/".to_string());

        let hosted = host.upload(image("image/png", 8)).await.unwrap();

        assert!(hosted.url.starts_with("/files/"));
        assert!(hosted.url.ends_with(".png"));
        let key = hosted.url.trim_start_matches("/files/");
        assert_eq!(tokio::fs::read(dir.join(key)).await.unwrap().len(), 8);
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[test]
    fn test_cloudinary_endpoint() {
        let host =
            CloudinaryImageHost::new("https://api.cloudinary.com/v1_1/", "demo", "ml_default")
                .unwrap();
        assert_eq!(
            host.endpoint(),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
    }

    #[test]
    fn test_cloudinary_requires_cloud_name() {
        let config = MediaConfig {
            backend: MediaBackend::Cloudinary,
            ..MediaConfig::default()
        };
        assert!(matches!(
            image_host_from_config(&config),
            Err(AppError::Config(_))
        ));
    }
}
