use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

#[async_trait]
#[automock]
pub trait AssetStorageClient {
    /// Uploads one order asset and returns its public URL.
    async fn upload_order_asset(
        &self,
        object_key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String>;

    async fn delete_object(&self, object_key: &str) -> Result<()>;
}
