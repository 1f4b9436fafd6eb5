use tracing::info;

use crate::campaign::manager::CampaignService;
use crate::campaign::{CampaignRequest, MetricBody};
use crate::error::Error;

pub async fn seed(service: &CampaignService) -> Result<(), Error> {
    service.database().reset().await?;

    let campaigns = vec![
        CampaignRequest {
            campaign_name: "Spring Sale".to_string(),
            budget: 1000.0,
            placement_url: "/spring".to_string(),
            referral_link: Some("9f86d081884c7d65".to_string()),
            metric: Some(MetricBody {
                click_count: 1250,
                ctr: 0.042,
                conversion_rate: 0.013,
                roi: 1.8,
            }),
        },
        CampaignRequest {
            campaign_name: "Back To School".to_string(),
            budget: 450.0,
            placement_url: "/back-to-school".to_string(),
            referral_link: Some("3c59dc048e885024".to_string()),
            metric: None,
        },
    ];

    for request in campaigns {
        let campaign = service.create_campaign(request).await?;
        info!("seeded campaign {:?}", campaign.id);
    }

    Ok(())
}
