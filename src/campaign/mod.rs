use chrono::{DateTime, Utc};
use mongodb::bson;
use serde::{Deserialize, Serialize};

use crate::typedid::{TypedId, TypedIdMarker};

pub mod db;
pub mod endpoints;
pub mod manager;
pub mod mapper;
pub use endpoints::*;

pub type CampaignId = TypedId<Campaign>;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Campaign {
    #[serde(rename = "_id")]
    pub id: CampaignId,
    pub campaign_name: String,
    pub budget: f64,
    pub placement_url: String,
    pub referral_link: Option<String>,
    pub metric: Option<Metric>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub modified_at: DateTime<Utc>,
}

/// Current time at the millisecond precision a BSON date keeps, so a
/// campaign reads back exactly as it was written.
pub fn now() -> DateTime<Utc> {
    bson::DateTime::now().to_chrono()
}

impl TypedIdMarker for Campaign {
    fn tag() -> &'static str {
        "CPN"
    }

    fn sequence() -> &'static str {
        "campaigns"
    }
}

/// A campaign that hasn't been stored yet. The store assigns its id and
/// timestamps when inserting it.
#[derive(Clone, Debug, PartialEq)]
pub struct NewCampaign {
    pub campaign_name: String,
    pub budget: f64,
    pub placement_url: String,
    pub referral_link: Option<String>,
    pub metric: Option<Metric>,
}

impl NewCampaign {
    pub fn into_campaign(self, id: CampaignId, now: DateTime<Utc>) -> Campaign {
        Campaign {
            id,
            campaign_name: self.campaign_name,
            budget: self.budget,
            placement_url: self.placement_url,
            referral_link: self.referral_link,
            metric: self.metric,
            created_at: now,
            modified_at: now,
        }
    }
}

// Populated by the click tracking side; this service only attaches a
// zeroed one when a campaign is created without it.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Metric {
    pub click_count: i64,
    pub ctr: f64,
    pub conversion_rate: f64,
    pub roi: f64,
}

/// Read-only projection of a campaign and its metric, built on every read.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct CampaignReport {
    pub campaign_name: String,
    pub budget: f64,
    pub click_count: i64,
    pub ctr: f64,
    pub conversion_rate: f64,
    pub roi: f64,
}

impl CampaignReport {
    pub fn render(campaign: &Campaign) -> CampaignReport {
        let mut report = CampaignReport {
            campaign_name: campaign.campaign_name.clone(),
            budget: campaign.budget,
            ..Default::default()
        };

        if let Some(metric) = &campaign.metric {
            report.click_count = metric.click_count;
            report.ctr = metric.ctr;
            report.conversion_rate = metric.conversion_rate;
            report.roi = metric.roi;
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign(metric: Option<Metric>) -> Campaign {
        NewCampaign {
            campaign_name: "Spring Sale".into(),
            budget: 1000.0,
            placement_url: "/spring".into(),
            referral_link: Some("a1b2c3".into()),
            metric,
        }
        .into_campaign(CampaignId::from_raw(1), now())
    }

    #[test]
    fn report_copies_metric_fields() {
        let metric = Metric {
            click_count: 120,
            ctr: 0.12,
            conversion_rate: 0.03,
            roi: 1.75,
        };

        let report = CampaignReport::render(&campaign(Some(metric)));

        assert_eq!(
            report,
            CampaignReport {
                campaign_name: "Spring Sale".into(),
                budget: 1000.0,
                click_count: 120,
                ctr: 0.12,
                conversion_rate: 0.03,
                roi: 1.75,
            }
        );
    }

    #[test]
    fn report_without_metric_is_zeroed() {
        let report = CampaignReport::render(&campaign(None));

        assert_eq!(report.campaign_name, "Spring Sale");
        assert_eq!(report.budget, 1000.0);
        assert_eq!(report.click_count, 0);
        assert_eq!(report.ctr, 0.0);
        assert_eq!(report.conversion_rate, 0.0);
        assert_eq!(report.roi, 0.0);
    }

    #[test]
    fn new_campaign_gets_matching_timestamps() {
        let campaign = campaign(None);

        assert_eq!(campaign.id, CampaignId::from_raw(1));
        assert_eq!(campaign.created_at, campaign.modified_at);
    }

    #[test]
    fn campaign_is_unchanged_by_bson_round_trip() {
        let inserted = campaign(Some(Metric::default()));

        let document = bson::to_document(&inserted).unwrap();
        let stored: Campaign = bson::from_document(document).unwrap();

        assert_eq!(stored, inserted);
    }
}
