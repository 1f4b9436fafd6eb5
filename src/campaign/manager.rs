use std::sync::Arc;

use crate::database::{self, Database};
use crate::error::Error;

use super::db::CampaignStore;
use super::mapper::CampaignMapper;
use super::{Campaign, CampaignBody, CampaignId, CampaignReport, CampaignRequest, Metric};

/// Campaign operations. Each call runs in its own transaction, which is
/// committed when the call succeeds and aborted when it fails.
#[derive(Clone)]
pub struct CampaignService {
    db: Arc<dyn Database>,
    mapper: Arc<dyn CampaignMapper>,
}

impl CampaignService {
    pub fn new(db: Arc<dyn Database>, mapper: Arc<dyn CampaignMapper>) -> CampaignService {
        CampaignService { db, mapper }
    }

    pub fn database(&self) -> &dyn Database {
        &*self.db
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_campaigns(&self) -> Result<Vec<CampaignBody>, Error> {
        let mut transaction = self.db.begin().await?;
        let result = transaction.campaigns().fetch_campaigns().await;
        let campaigns = database::complete(transaction, result).await?;

        let body = campaigns
            .into_iter()
            .map(|campaign| self.mapper.to_body(campaign))
            .collect();

        Ok(body)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_campaign_by_id(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Option<CampaignBody>, Error> {
        let mut transaction = self.db.begin().await?;
        let result = transaction
            .campaigns()
            .fetch_campaign_by_id(campaign_id)
            .await;
        let campaign = database::complete(transaction, result).await?;

        Ok(campaign.map(|campaign| self.mapper.to_body(campaign)))
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_campaign(&self, request: CampaignRequest) -> Result<CampaignBody, Error> {
        let mut transaction = self.db.begin().await?;
        let result = insert_new_campaign(transaction.campaigns(), &*self.mapper, request).await;
        let campaign = database::complete(transaction, result).await?;

        Ok(self.mapper.to_body(campaign))
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_campaign(
        &self,
        campaign_id: CampaignId,
        request: CampaignRequest,
    ) -> Result<CampaignBody, Error> {
        let mut transaction = self.db.begin().await?;
        let result = update_existing_campaign(transaction.campaigns(), campaign_id, request).await;
        let campaign = database::complete(transaction, result).await?;

        Ok(self.mapper.to_body(campaign))
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_campaign(&self, campaign_id: CampaignId) -> Result<(), Error> {
        let mut transaction = self.db.begin().await?;
        let result = delete_existing_campaign(transaction.campaigns(), campaign_id).await;

        database::complete(transaction, result).await
    }

    /// Returns the stored campaign rather than its body, for callers that
    /// attribute referral traffic.
    #[tracing::instrument(skip(self))]
    pub async fn find_by_referral_link(
        &self,
        referral_link: &str,
    ) -> Result<Option<Campaign>, Error> {
        let mut transaction = self.db.begin().await?;
        let result = transaction
            .campaigns()
            .fetch_campaign_by_referral_link(referral_link)
            .await;

        database::complete(transaction, result).await
    }

    pub fn render(&self, campaign: Campaign) -> CampaignBody {
        self.mapper.to_body(campaign)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_campaign_reports(&self) -> Result<Vec<CampaignReport>, Error> {
        let mut transaction = self.db.begin().await?;
        let result = transaction.campaigns().fetch_campaigns().await;
        let campaigns = database::complete(transaction, result).await?;

        Ok(campaigns.iter().map(CampaignReport::render).collect())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_campaign_report_by_id(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Option<CampaignReport>, Error> {
        let mut transaction = self.db.begin().await?;
        let result = transaction
            .campaigns()
            .fetch_campaign_by_id(campaign_id)
            .await;
        let campaign = database::complete(transaction, result).await?;

        Ok(campaign.as_ref().map(CampaignReport::render))
    }
}

async fn insert_new_campaign(
    store: &mut dyn CampaignStore,
    mapper: &dyn CampaignMapper,
    request: CampaignRequest,
) -> Result<Campaign, Error> {
    if store.campaign_name_exists(&request.campaign_name).await? {
        return Err(Error::CampaignNameAlreadyExists {
            campaign_name: request.campaign_name,
        });
    }

    let mut campaign = mapper.to_campaign(request);
    if campaign.metric.is_none() {
        campaign.metric = Some(Metric::default());
    }

    store.insert_campaign(campaign).await
}

// the referral link and metric are owned by other flows and never touched here
async fn update_existing_campaign(
    store: &mut dyn CampaignStore,
    campaign_id: CampaignId,
    request: CampaignRequest,
) -> Result<Campaign, Error> {
    let mut campaign = store
        .fetch_campaign_by_id(campaign_id)
        .await?
        .ok_or(Error::CampaignNotFound { campaign_id })?;

    campaign.campaign_name = request.campaign_name;
    campaign.budget = request.budget;
    campaign.placement_url = request.placement_url;

    store.update_campaign(campaign).await
}

async fn delete_existing_campaign(
    store: &mut dyn CampaignStore,
    campaign_id: CampaignId,
) -> Result<(), Error> {
    let campaign = store
        .fetch_campaign_by_id(campaign_id)
        .await?
        .ok_or(Error::CampaignNotFound { campaign_id })?;

    store.delete_campaign(&campaign).await
}
