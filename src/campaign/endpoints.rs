use actix_web::web::{Data, Json, Path};
use actix_web::{delete, get, post, put, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

use super::manager::CampaignService;
use super::{CampaignId, CampaignReport, Metric};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CampaignRequest {
    pub campaign_name: String,
    pub budget: f64,
    pub placement_url: String,
    #[serde(default)]
    pub referral_link: Option<String>,
    #[serde(default)]
    pub metric: Option<MetricBody>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct CampaignBody {
    pub id: CampaignId,
    pub campaign_name: String,
    pub budget: f64,
    pub placement_url: String,
    pub referral_link: Option<String>,
    pub metric: Option<MetricBody>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct MetricBody {
    pub click_count: i64,
    pub ctr: f64,
    pub conversion_rate: f64,
    pub roi: f64,
}

impl MetricBody {
    pub fn render(metric: Metric) -> MetricBody {
        MetricBody {
            click_count: metric.click_count,
            ctr: metric.ctr,
            conversion_rate: metric.conversion_rate,
            roi: metric.roi,
        }
    }

    pub fn into_metric(self) -> Metric {
        Metric {
            click_count: self.click_count,
            ctr: self.ctr,
            conversion_rate: self.conversion_rate,
            roi: self.roi,
        }
    }
}

#[get("/campaigns")]
#[tracing::instrument(skip(service))]
pub async fn get_campaigns(
    service: Data<CampaignService>,
) -> Result<Json<Vec<CampaignBody>>, Error> {
    let body = service.get_campaigns().await?;

    Ok(Json(body))
}

#[post("/campaigns")]
#[tracing::instrument(skip(service))]
pub async fn create_campaign(
    service: Data<CampaignService>,
    body: Json<CampaignRequest>,
) -> Result<Json<CampaignBody>, Error> {
    let body = service.create_campaign(body.into_inner()).await?;

    Ok(Json(body))
}

#[get("/campaigns/{campaign_id}")]
#[tracing::instrument(skip(service))]
pub async fn get_campaign_by_id(
    service: Data<CampaignService>,
    params: Path<CampaignId>,
) -> Result<Json<CampaignBody>, Error> {
    let campaign_id = params.into_inner();

    let body = service
        .get_campaign_by_id(campaign_id)
        .await?
        .ok_or(Error::CampaignNotFound { campaign_id })?;

    Ok(Json(body))
}

#[put("/campaigns/{campaign_id}")]
#[tracing::instrument(skip(service))]
pub async fn update_campaign(
    service: Data<CampaignService>,
    params: Path<CampaignId>,
    body: Json<CampaignRequest>,
) -> Result<Json<CampaignBody>, Error> {
    let campaign_id = params.into_inner();

    let body = service
        .update_campaign(campaign_id, body.into_inner())
        .await?;

    Ok(Json(body))
}

#[delete("/campaigns/{campaign_id}")]
#[tracing::instrument(skip(service))]
pub async fn delete_campaign(
    service: Data<CampaignService>,
    params: Path<CampaignId>,
) -> Result<HttpResponse, Error> {
    service.delete_campaign(params.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}

#[get("/campaigns/referral/{referral_link:.*}")]
#[tracing::instrument(skip(service))]
pub async fn get_campaign_by_referral_link(
    service: Data<CampaignService>,
    params: Path<String>,
) -> Result<Json<CampaignBody>, Error> {
    let referral_link = params.into_inner();

    let campaign = service
        .find_by_referral_link(&referral_link)
        .await?
        .ok_or(Error::ReferralLinkNotFound { referral_link })?;

    Ok(Json(service.render(campaign)))
}

#[get("/reports/campaigns")]
#[tracing::instrument(skip(service))]
pub async fn get_campaign_reports(
    service: Data<CampaignService>,
) -> Result<Json<Vec<CampaignReport>>, Error> {
    let body = service.get_campaign_reports().await?;

    Ok(Json(body))
}

#[get("/reports/campaigns/{campaign_id}")]
#[tracing::instrument(skip(service))]
pub async fn get_campaign_report_by_id(
    service: Data<CampaignService>,
    params: Path<CampaignId>,
) -> Result<Json<CampaignReport>, Error> {
    let campaign_id = params.into_inner();

    let body = service
        .get_campaign_report_by_id(campaign_id)
        .await?
        .ok_or(Error::CampaignNotFound { campaign_id })?;

    Ok(Json(body))
}
