//! Hand-off point to per-asset harvesting.
use crate::model::CreatedCollection;
use async_trait::async_trait;
use harvest_drivers::BrowserSession;
use tracing::info;

/// Scrapes the assets of a freshly created collection.
///
/// Implementations borrow the harvester's browser session for the duration of
/// the call and may navigate it freely.
#[async_trait]
pub trait AssetHarvester: Send {
    async fn harvest_assets(
        &mut self,
        session: &mut dyn BrowserSession,
        collection: &CreatedCollection,
    ) -> anyhow::Result<()>;
}

/// Records each hand-off in the log without touching the session.
#[derive(Debug, Default)]
pub struct LogOnlyAssetHarvester {
    handed_off: usize,
}

impl LogOnlyAssetHarvester {
    pub fn handed_off(&self) -> usize {
        self.handed_off
    }
}

#[async_trait]
impl AssetHarvester for LogOnlyAssetHarvester {
    async fn harvest_assets(
        &mut self,
        _session: &mut dyn BrowserSession,
        collection: &CreatedCollection,
    ) -> anyhow::Result<()> {
        self.handed_off += 1;
        info!(
            target: "harvest.assets",
            collection_id = %collection.collection_id,
            name = %collection.info.name,
            item_cnt = collection.item_cnt,
            "asset harvest requested"
        );
        Ok(())
    }
}
