// Hub device inventory endpoint

use tracing::debug;

use crate::client::HubClient;
use crate::error::Error;

impl HubClient {
    /// List all devices known to the hub.
    ///
    /// `GET /api/devices`
    ///
    /// Returns the raw description objects; a body that is not a JSON
    /// array fails with [`Error::Deserialization`].
    pub async fn list_devices(&self) -> Result<Vec<serde_json::Value>, Error> {
        let url = self.api_url("devices")?;
        debug!("listing devices");
        self.get_json(url).await
    }
}
