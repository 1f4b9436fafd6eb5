use super::{Campaign, CampaignBody, CampaignRequest, MetricBody, NewCampaign};

/// Translates between the bodies exchanged with clients and the stored
/// campaign.
pub trait CampaignMapper: Send + Sync {
    fn to_campaign(&self, request: CampaignRequest) -> NewCampaign;

    fn to_body(&self, campaign: Campaign) -> CampaignBody;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BodyMapper;

impl CampaignMapper for BodyMapper {
    fn to_campaign(&self, request: CampaignRequest) -> NewCampaign {
        NewCampaign {
            campaign_name: request.campaign_name,
            budget: request.budget,
            placement_url: request.placement_url,
            referral_link: request.referral_link,
            metric: request.metric.map(MetricBody::into_metric),
        }
    }

    fn to_body(&self, campaign: Campaign) -> CampaignBody {
        CampaignBody {
            id: campaign.id,
            campaign_name: campaign.campaign_name,
            budget: campaign.budget,
            placement_url: campaign.placement_url,
            referral_link: campaign.referral_link,
            metric: campaign.metric.map(MetricBody::render),
            created_at: campaign.created_at,
            modified_at: campaign.modified_at,
        }
    }
}
