use std::env;
use std::path::PathBuf;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use uuid::Uuid;

/// Folder post images are stored under, relative to the media root.
pub const POST_IMAGE_FOLDER: &str = "posts";

/// Cloudinary configuration loaded from environment variables
#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub upload_preset: Option<String>,
}

impl CloudinaryConfig {
    /// Load Cloudinary configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            cloud_name: env::var("CLOUDINARY_CLOUD_NAME")
                .map_err(|_| "CLOUDINARY_CLOUD_NAME is required")?,
            api_key: env::var("CLOUDINARY_API_KEY")
                .map_err(|_| "CLOUDINARY_API_KEY is required")?,
            api_secret: env::var("CLOUDINARY_API_SECRET")
                .map_err(|_| "CLOUDINARY_API_SECRET is required")?,
            upload_preset: env::var("CLOUDINARY_UPLOAD_PRESET").ok(),
        })
    }

    pub fn upload_url(&self, resource_type: &str) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/{}/upload",
            self.cloud_name, resource_type
        )
    }

    /// Signature for authenticated uploads: sha1 of the sorted params,
    /// the timestamp and the api secret.
    pub fn generate_signature(&self, params: &str, timestamp: i64) -> String {
        let to_sign = if params.is_empty() {
            format!("timestamp={}{}", timestamp, self.api_secret)
        } else {
            format!("{}&timestamp={}{}", params, timestamp, self.api_secret)
        };
        let mut hasher = Sha1::new();
        hasher.update(to_sign.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[derive(Debug, Deserialize)]
pub struct CloudinaryUploadResponse {
    pub public_id: String,
    pub secure_url: String,
    pub bytes: u64,
}

#[derive(Debug, Deserialize)]
pub struct CloudinaryError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CloudinaryErrorResponse {
    pub error: CloudinaryError,
}

/// Upload service for Cloudinary
pub struct UploadService {
    config: CloudinaryConfig,
    client: reqwest::Client,
}

impl UploadService {
    pub fn with_config(config: CloudinaryConfig) -> Self {
        let client = reqwest::Client::new();
        Self { config, client }
    }

    pub async fn upload_image(
        &self,
        file: FileUpload,
        folder: Option<&str>,
    ) -> Result<CloudinaryUploadResponse, String> {
        let timestamp = chrono::Utc::now().timestamp();
        let upload_url = self.config.upload_url("image");

        // Params must be signed in alphabetical order
        let mut params = String::new();
        if let Some(f) = folder {
            params.push_str(&format!("folder={}", f));
        }
        if let Some(ref preset) = self.config.upload_preset {
            if !params.is_empty() {
                params.push('&');
            }
            params.push_str(&format!("upload_preset={}", preset));
        }

        let signature = self.config.generate_signature(&params, timestamp);

        let mime = file
            .content_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let file_part = Part::bytes(file.data)
            .file_name(file.file_name)
            .mime_str(&mime)
            .map_err(|e| format!("Failed to create file part: {}", e))?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature", signature);

        if let Some(f) = folder {
            form = form.text("folder", f.to_string());
        }

        if let Some(ref preset) = self.config.upload_preset {
            form = form.text("upload_preset", preset.clone());
        }

        let response = self
            .client
            .post(&upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| format!("Failed to send upload request: {}", e))?;

        if response.status().is_success() {
            response
                .json::<CloudinaryUploadResponse>()
                .await
                .map_err(|e| format!("Failed to parse upload response: {}", e))
        } else {
            let error_response = response
                .json::<CloudinaryErrorResponse>()
                .await
                .map_err(|e| format!("Failed to parse error response: {}", e))?;
            Err(format!(
                "Cloudinary upload failed: {}",
                error_response.error.message
            ))
        }
    }
}

/// A file received in a multipart form.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub data: Vec<u8>,
    pub content_type: Option<String>,
}

impl FileUpload {
    pub fn new(file_name: String, data: Vec<u8>, content_type: Option<String>) -> Self {
        Self {
            file_name,
            data,
            content_type,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.file_name.rsplit_once('.')?;
        Some(ext.to_lowercase())
    }
}

#[derive(Debug, Clone)]
pub struct FileValidator {
    /// Allowed file extensions (e.g., ["jpg", "png", "gif"])
    pub allowed_extensions: Vec<String>,
    /// Maximum file size in bytes
    pub max_file_size: usize,
}

impl FileValidator {
    /// Raster images a browser can display, max 10MB.
    pub fn images() -> Self {
        Self {
            allowed_extensions: ["jpg", "jpeg", "png", "gif", "webp", "bmp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_file_size: 10 * 1024 * 1024,
        }
    }

    pub fn validate(&self, file: &FileUpload) -> Result<(), String> {
        if file.data.is_empty() {
            return Err("The submitted file is empty.".to_string());
        }

        let extension = file.extension().ok_or("File has no extension")?;
        if !self.allowed_extensions.contains(&extension) {
            return Err(format!(
                "Invalid file type '{}'. Allowed types: {}",
                extension,
                self.allowed_extensions.join(", ")
            ));
        }

        if let Some(content_type) = file.content_type.as_deref() {
            if !content_type.starts_with("image/") {
                return Err(format!(
                    "Upload a valid image. '{}' is not an image type.",
                    content_type
                ));
            }
        }

        if file.size() > self.max_file_size {
            return Err(format!(
                "File too large. Maximum size: {}, file size: {}",
                Self::format_size(self.max_file_size),
                Self::format_size(file.size())
            ));
        }

        Ok(())
    }

    pub fn format_size(bytes: usize) -> String {
        const KB: usize = 1024;
        const MB: usize = KB * 1024;

        if bytes >= MB {
            format!("{:.2} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.2} KB", bytes as f64 / KB as f64)
        } else {
            format!("{} bytes", bytes)
        }
    }
}

/// Where accepted post images end up. Returns the public URL of the stored file.
pub enum MediaStorage {
    Local { root: PathBuf, base_url: String },
    Cloudinary(UploadService),
}

impl MediaStorage {
    pub fn local(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        MediaStorage::Local {
            root: root.into(),
            base_url,
        }
    }

    pub async fn store(&self, file: FileUpload, folder: &str) -> Result<String, String> {
        match self {
            MediaStorage::Local { root, base_url } => {
                let dir = root.join(folder);
                tokio::fs::create_dir_all(&dir)
                    .await
                    .map_err(|e| format!("Failed to create media directory: {}", e))?;

                let name = match file.extension() {
                    Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
                    None => Uuid::new_v4().to_string(),
                };
                tokio::fs::write(dir.join(&name), &file.data)
                    .await
                    .map_err(|e| format!("Failed to write {}: {}", name, e))?;

                Ok(format!("{}{}/{}", base_url, folder, name))
            }
            MediaStorage::Cloudinary(service) => service
                .upload_image(file, Some(folder))
                .await
                .map(|uploaded| uploaded.secure_url),
        }
    }
}
