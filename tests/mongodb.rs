//! These need a MongoDB replica set, since every call runs in a transaction:
//!
//! MONGODB_URI="mongodb://localhost:27017/?replicaSet=rs0" cargo test -- --ignored

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::web::{self, Data};
use actix_web::{test, App};
use mongodb::bson::Document;
use mongodb::Client;
use serde_json::Value;

use campaign_server::campaign::NewCampaign;
use campaign_server::database::mongo::{CAMPAIGNS, SEQUENCES};
use campaign_server::database::{Database, MongoDatabase};
use campaign_server::error::Error;
use campaign_server::{BodyMapper, CampaignBody, CampaignRequest, CampaignService};

// Each test gets its own database, emptied before use.
async fn database(name: &str) -> (mongodb::Database, MongoDatabase) {
    let uri =
        std::env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".into());
    let name = format!("campaign_server_test_{}", name);

    let client = Client::with_uri_str(&uri).await.unwrap();
    let db = MongoDatabase::initialize(client.clone(), &name)
        .await
        .unwrap();
    db.reset().await.unwrap();

    (client.database(&name), db)
}

fn request(name: &str, budget: f64, placement_url: &str) -> CampaignRequest {
    CampaignRequest {
        campaign_name: name.into(),
        budget,
        placement_url: placement_url.into(),
        referral_link: None,
        metric: None,
    }
}

fn new_campaign(name: &str) -> NewCampaign {
    NewCampaign {
        campaign_name: name.into(),
        budget: 100.0,
        placement_url: "/landing".into(),
        referral_link: None,
        metric: None,
    }
}

macro_rules! init_app {
    ($db:expr) => {
        test::init_service(
            App::new()
                .app_data(Data::new(CampaignService::new(
                    Arc::new($db.clone()),
                    Arc::new(BodyMapper),
                )))
                .configure(campaign_server::configure)
                .default_service(web::to(campaign_server::path_not_found)),
        )
        .await
    };
}

#[actix_web::test]
#[ignore]
async fn campaign_lifecycle() {
    let (raw, db) = database("campaign_lifecycle").await;
    let app = init_app!(db);

    let req = test::TestRequest::post()
        .uri("/campaigns")
        .set_json(&request("Spring Sale", 1000.0, "/spring"))
        .to_request();
    let spring: CampaignBody = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/campaigns")
        .set_json(&request("Back To School", 400.0, "/school"))
        .to_request();
    let school: CampaignBody = test::call_and_read_body_json(&app, req).await;

    assert_eq!(spring.id.get(), 1);
    assert_eq!(school.id.get(), 2);

    let req = test::TestRequest::get().uri("/campaigns/1").to_request();
    let fetched: CampaignBody = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched, spring);

    let req = test::TestRequest::post()
        .uri("/campaigns")
        .set_json(&request("Spring Sale", 500.0, "/x"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let error: Value = test::read_body_json(resp).await;
    assert_eq!(error["error_code"], "E4091000");

    let req = test::TestRequest::get().uri("/campaigns").to_request();
    let campaigns: Vec<CampaignBody> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(campaigns, vec![spring.clone(), school]);

    let req = test::TestRequest::put()
        .uri("/campaigns/1")
        .set_json(&request("Spring Sale v2", 1200.0, "/spring2"))
        .to_request();
    let updated: CampaignBody = test::call_and_read_body_json(&app, req).await;

    assert_eq!(updated.campaign_name, "Spring Sale v2");
    assert_eq!(updated.budget, 1200.0);
    assert_eq!(updated.created_at, spring.created_at);

    let req = test::TestRequest::get().uri("/campaigns/1").to_request();
    let fetched: CampaignBody = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched, updated);

    let req = test::TestRequest::delete().uri("/campaigns/1").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get().uri("/campaigns/1").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    raw.drop(None).await.unwrap();
}

#[actix_web::test]
#[ignore]
async fn aborted_create_leaves_no_campaign_or_sequence() {
    let (raw, db) = database("aborted_create").await;

    let mut tx = db.begin().await.unwrap();
    let ghost = tx
        .campaigns()
        .insert_campaign(new_campaign("Ghost"))
        .await
        .unwrap();
    assert_eq!(ghost.id.get(), 1);
    tx.abort().await.unwrap();

    let campaigns = raw
        .collection::<Document>(CAMPAIGNS)
        .count_documents(None, None)
        .await
        .unwrap();
    let sequences = raw
        .collection::<Document>(SEQUENCES)
        .count_documents(None, None)
        .await
        .unwrap();
    assert_eq!(campaigns, 0);
    assert_eq!(sequences, 0);

    let mut tx = db.begin().await.unwrap();
    let real = tx
        .campaigns()
        .insert_campaign(new_campaign("Real"))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(real.id.get(), 1);

    raw.drop(None).await.unwrap();
}

#[actix_web::test]
#[ignore]
async fn update_matches_on_stored_modification_time() {
    let (raw, db) = database("update_modification_time").await;

    let mut tx = db.begin().await.unwrap();
    let campaign = tx
        .campaigns()
        .insert_campaign(new_campaign("One"))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let mut tx = db.begin().await.unwrap();

    let mut renamed = campaign.clone();
    renamed.campaign_name = "Uno".into();
    let renamed = tx.campaigns().update_campaign(renamed).await.unwrap();

    // the returned campaign carries the stored timestamp, so it can be
    // updated again
    let mut again = renamed;
    again.campaign_name = "Eins".into();
    let again = tx.campaigns().update_campaign(again).await.unwrap();

    let mut stale = campaign;
    stale.campaign_name = "Stale".into();
    stale.modified_at = stale.modified_at - chrono::Duration::seconds(1);
    let result = tx.campaigns().update_campaign(stale).await;
    assert_eq!(result.unwrap_err(), Error::ConcurrentModificationDetected);

    let stored = tx.campaigns().fetch_campaign_by_id(again.id).await.unwrap();
    assert_eq!(stored, Some(again));
    tx.commit().await.unwrap();

    raw.drop(None).await.unwrap();
}
