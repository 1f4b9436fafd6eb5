use std::sync::Arc;

use actix_web::web::{self, Data, JsonConfig, PathConfig, ServiceConfig};
use actix_web::{App, HttpResponse, HttpServer, ResponseError};
use mongodb::Client;
use tracing::info;
use tracing_actix_web::TracingLogger;

pub mod campaign;
pub mod config;
pub mod database;
pub mod error;
mod seed;
pub mod typedid;

pub use campaign::manager::CampaignService;
pub use campaign::mapper::{BodyMapper, CampaignMapper};
pub use campaign::{CampaignBody, CampaignReport, CampaignRequest, MetricBody};

use config::{Config, StoreKind};
use database::{Database, MemoryDatabase, MongoDatabase};
use error::Error;

/// Registers the campaign routes and the extractor error formatting.
/// Expects a `Data<CampaignService>` to be provided by the app.
pub fn configure(config: &mut ServiceConfig) {
    config
        .app_data(JsonConfig::default().error_handler(|err, _req| {
            // format json errors with custom format
            Error::InvalidJson(err).into()
        }))
        .app_data(PathConfig::default().error_handler(|err, _req| {
            // format path errors with custom format
            Error::InvalidPath(err).into()
        }))
        .service(campaign::endpoints::create_campaign)
        .service(campaign::endpoints::get_campaigns)
        .service(campaign::endpoints::get_campaign_by_referral_link)
        .service(campaign::endpoints::get_campaign_by_id)
        .service(campaign::endpoints::update_campaign)
        .service(campaign::endpoints::delete_campaign)
        .service(campaign::endpoints::get_campaign_reports)
        .service(campaign::endpoints::get_campaign_report_by_id);
}

pub async fn path_not_found() -> HttpResponse {
    Error::PathNotFound.error_response()
}

pub async fn connect(config: &Config) -> Result<Arc<dyn Database>, Error> {
    match config.store {
        StoreKind::MongoDb => {
            info!("connecting to db: {}", config.mongodb_uri);
            let client = Client::with_uri_str(&config.mongodb_uri).await?;
            let db = MongoDatabase::initialize(client, &config.database_name).await?;
            Ok(Arc::new(db))
        }
        StoreKind::Memory => {
            info!("using in-memory store");
            Ok(Arc::new(MemoryDatabase::new()))
        }
    }
}

pub async fn run(config: Config) -> Result<(), Error> {
    let db = connect(&config).await?;
    let service = CampaignService::new(db, Arc::new(BodyMapper));

    if config.seed {
        seed::seed(&service).await?;
    }

    info!("listening on {}", config.bind_address);
    HttpServer::new(move || {
        App::new()
            .app_data(Data::new(service.clone()))
            .wrap(TracingLogger::default())
            .configure(configure)
            .default_service(web::to(path_not_found))
    })
    .bind(config.bind_address.as_str())?
    .run()
    .await?;

    Ok(())
}
