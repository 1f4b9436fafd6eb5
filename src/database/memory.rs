use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::campaign::db::CampaignStore;
use crate::campaign::{now, Campaign, CampaignId, NewCampaign};
use crate::error::Error;

use super::{Database, Transaction};

#[derive(Clone, Debug, Default)]
struct MemoryState {
    campaigns: BTreeMap<CampaignId, Campaign>,
    last_campaign_id: i64,
}

/// Process-local store for local runs and tests. A transaction holds the
/// lock for its whole lifetime, so transactions run one after another.
/// Reads work on the locked state directly and only the first write in a
/// transaction copies it.
#[derive(Clone, Debug, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDatabase {
    pub fn new() -> MemoryDatabase {
        MemoryDatabase::default()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    #[tracing::instrument(skip(self))]
    async fn begin(&self) -> Result<Box<dyn Transaction>, Error> {
        let guard = Arc::clone(&self.state).lock_owned().await;

        Ok(Box::new(MemoryTransaction {
            guard,
            working: None,
        }))
    }

    #[tracing::instrument(skip(self))]
    async fn reset(&self) -> Result<(), Error> {
        *self.state.lock().await = MemoryState::default();

        Ok(())
    }
}

// reads see the locked state until the first write copies it into
// `working`; commit moves the copy back
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: Option<MemoryState>,
}

impl MemoryTransaction {
    fn state(&self) -> &MemoryState {
        self.working.as_ref().unwrap_or(&*self.guard)
    }

    fn state_mut(&mut self) -> &mut MemoryState {
        let guard = &self.guard;
        self.working.get_or_insert_with(|| MemoryState::clone(guard))
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    fn campaigns(&mut self) -> &mut dyn CampaignStore {
        self
    }

    async fn commit(self: Box<Self>) -> Result<(), Error> {
        let MemoryTransaction { mut guard, working } = *self;
        if let Some(working) = working {
            *guard = working;
        }

        Ok(())
    }

    async fn abort(self: Box<Self>) -> Result<(), Error> {
        Ok(())
    }
}

#[async_trait]
impl CampaignStore for MemoryTransaction {
    async fn fetch_campaigns(&mut self) -> Result<Vec<Campaign>, Error> {
        Ok(self.state().campaigns.values().cloned().collect())
    }

    async fn fetch_campaign_by_id(
        &mut self,
        campaign_id: CampaignId,
    ) -> Result<Option<Campaign>, Error> {
        Ok(self.state().campaigns.get(&campaign_id).cloned())
    }

    async fn campaign_name_exists(&mut self, campaign_name: &str) -> Result<bool, Error> {
        Ok(self
            .state()
            .campaigns
            .values()
            .any(|campaign| campaign.campaign_name == campaign_name))
    }

    async fn fetch_campaign_by_referral_link(
        &mut self,
        referral_link: &str,
    ) -> Result<Option<Campaign>, Error> {
        Ok(self
            .state()
            .campaigns
            .values()
            .find(|campaign| campaign.referral_link.as_deref() == Some(referral_link))
            .cloned())
    }

    async fn insert_campaign(&mut self, campaign: NewCampaign) -> Result<Campaign, Error> {
        let state = self.state_mut();
        state.last_campaign_id += 1;
        let campaign_id = CampaignId::from_raw(state.last_campaign_id);
        let campaign = campaign.into_campaign(campaign_id, now());

        state.campaigns.insert(campaign_id, campaign.clone());

        Ok(campaign)
    }

    async fn update_campaign(&mut self, mut campaign: Campaign) -> Result<Campaign, Error> {
        let stored = self
            .state_mut()
            .campaigns
            .get_mut(&campaign.id)
            .filter(|stored| stored.modified_at == campaign.modified_at)
            .ok_or(Error::ConcurrentModificationDetected)?;

        campaign.modified_at = now();
        *stored = campaign.clone();

        Ok(campaign)
    }

    async fn delete_campaign(&mut self, campaign: &Campaign) -> Result<(), Error> {
        self.state_mut()
            .campaigns
            .remove(&campaign.id)
            .map(|_| ())
            .ok_or(Error::ConcurrentModificationDetected)
    }
}
