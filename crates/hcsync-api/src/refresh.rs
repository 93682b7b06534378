// Hub refresh-state endpoints
//
// `refreshStates` without a cursor reports the current watermark; with
// `last=<cursor>` it long-polls until the hub has changes to report or
// the client-side timeout expires.

use tracing::debug;

use crate::client::HubClient;
use crate::error::Error;
use crate::models::{ChangeSet, RefreshStatus};

impl HubClient {
    /// Fetch the hub's current refresh cursor and status.
    ///
    /// `GET /api/refreshStates`
    pub async fn refresh_status(&self) -> Result<RefreshStatus, Error> {
        let url = self.api_url("refreshStates")?;
        debug!("fetching refresh status");
        self.get_json(url).await
    }

    /// Long-poll for changes since `last`.
    ///
    /// `GET /api/refreshStates?last={last}`
    pub async fn refresh_changes(&self, last: i64) -> Result<ChangeSet, Error> {
        let mut url = self.api_url("refreshStates")?;
        url.query_pairs_mut()
            .append_pair("last", &last.to_string());
        debug!(last, "polling for changes");
        self.get_json(url).await
    }
}
