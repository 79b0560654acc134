use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// 圖片快取資料夾
pub trait Storage: Send + Sync {
    fn full_path(&self, path: &str) -> PathBuf;
    fn exists(&self, path: &str) -> bool;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Request/response channel to the video device's xAPI.
#[async_trait]
pub trait ControlChannel: Send + Sync {
    /// Sends one XML command and returns the response body.
    async fn send(&self, payload: &str) -> Result<String>;
}
