use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson;
use mongodb::options::{CountOptions, FindOneAndUpdateOptions, FindOptions, ReturnDocument};

use crate::database::mongo::{MongoTransaction, CAMPAIGNS};
use crate::error::Error;
use crate::typedid::TypedIdMarker;

use super::{now, Campaign, CampaignId, NewCampaign};

pub async fn initialize(db: &mongodb::Database) -> Result<(), Error> {
    db.run_command(
        bson::doc! {
            "createIndexes": CAMPAIGNS,
            "indexes": [
                { "key": { "campaign_name": 1 }, "name": "by_campaign_name" },
                { "key": { "referral_link": 1 }, "name": "by_referral_link" },
            ]
        },
        None,
    )
    .await?;

    Ok(())
}

/// Campaign persistence, bound to the transaction it was taken from.
#[async_trait]
pub trait CampaignStore: Send {
    async fn fetch_campaigns(&mut self) -> Result<Vec<Campaign>, Error>;

    async fn fetch_campaign_by_id(
        &mut self,
        campaign_id: CampaignId,
    ) -> Result<Option<Campaign>, Error>;

    async fn campaign_name_exists(&mut self, campaign_name: &str) -> Result<bool, Error>;

    async fn fetch_campaign_by_referral_link(
        &mut self,
        referral_link: &str,
    ) -> Result<Option<Campaign>, Error>;

    async fn insert_campaign(&mut self, campaign: NewCampaign) -> Result<Campaign, Error>;

    async fn update_campaign(&mut self, campaign: Campaign) -> Result<Campaign, Error>;

    async fn delete_campaign(&mut self, campaign: &Campaign) -> Result<(), Error>;
}

#[async_trait]
impl CampaignStore for MongoTransaction {
    #[tracing::instrument(skip(self))]
    async fn fetch_campaigns(&mut self) -> Result<Vec<Campaign>, Error> {
        let options = FindOptions::builder().sort(bson::doc! { "_id": 1 }).build();

        let mut cursor = self
            .campaigns
            .find_with_session(bson::doc! {}, options, &mut self.session)
            .await?;
        let campaigns: Vec<Campaign> = cursor.stream(&mut self.session).try_collect().await?;

        Ok(campaigns)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_campaign_by_id(
        &mut self,
        campaign_id: CampaignId,
    ) -> Result<Option<Campaign>, Error> {
        let campaign: Option<Campaign> = self
            .campaigns
            .find_one_with_session(bson::doc! { "_id": campaign_id }, None, &mut self.session)
            .await?;

        Ok(campaign)
    }

    #[tracing::instrument(skip(self))]
    async fn campaign_name_exists(&mut self, campaign_name: &str) -> Result<bool, Error> {
        let options = CountOptions::builder().limit(1).build();

        let count = self
            .campaigns
            .count_documents_with_session(
                bson::doc! { "campaign_name": campaign_name },
                options,
                &mut self.session,
            )
            .await?;

        Ok(count > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_campaign_by_referral_link(
        &mut self,
        referral_link: &str,
    ) -> Result<Option<Campaign>, Error> {
        let campaign: Option<Campaign> = self
            .campaigns
            .find_one_with_session(
                bson::doc! { "referral_link": referral_link },
                None,
                &mut self.session,
            )
            .await?;

        Ok(campaign)
    }

    #[tracing::instrument(skip(self))]
    async fn insert_campaign(&mut self, campaign: NewCampaign) -> Result<Campaign, Error> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let sequence = self
            .sequences
            .find_one_and_update_with_session(
                bson::doc! { "_id": Campaign::sequence() },
                bson::doc! { "$inc": { "value": 1_i64 } },
                options,
                &mut self.session,
            )
            .await?
            .ok_or_else(|| {
                Error::ExistentialState(format!(
                    "sequence '{}' missing after upsert",
                    Campaign::sequence()
                ))
            })?;

        let campaign = campaign.into_campaign(CampaignId::from_raw(sequence.value), now());

        self.campaigns
            .insert_one_with_session(&campaign, None, &mut self.session)
            .await?;

        Ok(campaign)
    }

    #[tracing::instrument(skip(self))]
    async fn update_campaign(&mut self, mut campaign: Campaign) -> Result<Campaign, Error> {
        let old_modified_at = bson::DateTime::from_chrono(campaign.modified_at);
        campaign.modified_at = now();

        let result = self
            .campaigns
            .replace_one_with_session(
                bson::doc! { "_id": campaign.id, "modified_at": old_modified_at },
                &campaign,
                None,
                &mut self.session,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(Error::ConcurrentModificationDetected);
        }

        Ok(campaign)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_campaign(&mut self, campaign: &Campaign) -> Result<(), Error> {
        let result = self
            .campaigns
            .delete_one_with_session(bson::doc! { "_id": campaign.id }, None, &mut self.session)
            .await?;

        if result.deleted_count == 0 {
            return Err(Error::ConcurrentModificationDetected);
        }

        Ok(())
    }
}
