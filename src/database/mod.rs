use async_trait::async_trait;
use tracing::warn;

use crate::campaign::db::CampaignStore;
use crate::error::Error;

pub mod memory;
pub mod mongo;

pub use memory::MemoryDatabase;
pub use mongo::MongoDatabase;

#[async_trait]
pub trait Database: Send + Sync {
    /// Starts a unit of work. Everything done through the returned
    /// transaction is visible to other callers only once it is committed.
    async fn begin(&self) -> Result<Box<dyn Transaction>, Error>;

    /// Removes every stored record.
    async fn reset(&self) -> Result<(), Error>;
}

#[async_trait]
pub trait Transaction: Send {
    fn campaigns(&mut self) -> &mut dyn CampaignStore;

    async fn commit(self: Box<Self>) -> Result<(), Error>;

    async fn abort(self: Box<Self>) -> Result<(), Error>;
}

/// Commits the transaction if the work inside it succeeded, aborts it
/// otherwise. The error from the work wins over an error from aborting.
pub async fn complete<T>(
    transaction: Box<dyn Transaction>,
    result: Result<T, Error>,
) -> Result<T, Error> {
    match result {
        Ok(value) => {
            transaction.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(abort_err) = transaction.abort().await {
                warn!("failed to abort transaction: {}", abort_err);
            }
            Err(err)
        }
    }
}
