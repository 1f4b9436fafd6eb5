use async_trait::async_trait;
use mongodb::{Client, ClientSession, Collection};
use serde::{Deserialize, Serialize};

use crate::campaign::db::{self as campaign_db, CampaignStore};
use crate::campaign::Campaign;
use crate::error::Error;

use super::{Database, Transaction};

pub const CAMPAIGNS: &str = "campaigns";
pub const SEQUENCES: &str = "sequences";

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Sequence {
    #[serde(rename = "_id")]
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone)]
pub struct MongoDatabase {
    client: Client,
    db: mongodb::Database,
}

impl MongoDatabase {
    pub async fn initialize(client: Client, name: &str) -> Result<MongoDatabase, Error> {
        let db = client.database(name);

        campaign_db::initialize(&db).await?;

        Ok(MongoDatabase { client, db })
    }
}

#[async_trait]
impl Database for MongoDatabase {
    #[tracing::instrument(skip(self))]
    async fn begin(&self) -> Result<Box<dyn Transaction>, Error> {
        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;

        Ok(Box::new(MongoTransaction {
            session,
            campaigns: self.db.collection(CAMPAIGNS),
            sequences: self.db.collection(SEQUENCES),
        }))
    }

    #[tracing::instrument(skip(self))]
    async fn reset(&self) -> Result<(), Error> {
        self.db.drop(None).await?;
        campaign_db::initialize(&self.db).await?;

        Ok(())
    }
}

/// A session with an open transaction. Stores taken from it read and
/// write through the session.
pub struct MongoTransaction {
    pub(crate) session: ClientSession,
    pub(crate) campaigns: Collection<Campaign>,
    pub(crate) sequences: Collection<Sequence>,
}

#[async_trait]
impl Transaction for MongoTransaction {
    fn campaigns(&mut self) -> &mut dyn CampaignStore {
        self
    }

    #[tracing::instrument(skip(self))]
    async fn commit(self: Box<Self>) -> Result<(), Error> {
        let mut transaction = self;
        transaction.session.commit_transaction().await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn abort(self: Box<Self>) -> Result<(), Error> {
        let mut transaction = self;
        transaction.session.abort_transaction().await?;

        Ok(())
    }
}
