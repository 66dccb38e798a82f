use async_trait::async_trait;
use models::{db::EVIDENCE_COLLECTION, Evidence};
use mongodb::{
    bson::{doc, oid::ObjectId},
    Collection, Database,
};

use crate::errors::ServiceError;

#[async_trait]
pub trait EvidenceRepository: Send + Sync {
    async fn insert(&self, evidence: Evidence) -> Result<ObjectId, ServiceError>;
    /// Most recently uploaded evidence for the payment.
    async fn find_by_payment(&self, payment_id: &str) -> Result<Option<Evidence>, ServiceError>;
    /// Returns the number of removed documents.
    async fn delete_by_payment(&self, payment_id: &str) -> Result<u64, ServiceError>;
}

#[derive(Clone)]
pub struct MongoEvidenceRepository {
    collection: Collection<Evidence>,
}

impl MongoEvidenceRepository {
    pub fn new(db: &Database) -> Self {
        Self { collection: db.collection::<Evidence>(EVIDENCE_COLLECTION) }
    }
}

#[async_trait]
impl EvidenceRepository for MongoEvidenceRepository {
    async fn insert(&self, evidence: Evidence) -> Result<ObjectId, ServiceError> {
        let res = self.collection.insert_one(&evidence).await?;
        res.inserted_id
            .as_object_id()
            .ok_or_else(|| ServiceError::Db("inserted _id is not an ObjectId".into()))
    }

    async fn find_by_payment(&self, payment_id: &str) -> Result<Option<Evidence>, ServiceError> {
        Ok(self
            .collection
            .find_one(doc! { "payment_id": payment_id })
            .sort(doc! { "_id": -1 })
            .await?)
    }

    async fn delete_by_payment(&self, payment_id: &str) -> Result<u64, ServiceError> {
        let res = self.collection.delete_many(doc! { "payment_id": payment_id }).await?;
        Ok(res.deleted_count)
    }
}

/// In-memory repository for tests and local runs without a database.
pub mod memory {
    use super::*;
    use tokio::sync::RwLock;

    #[derive(Default)]
    pub struct InMemoryEvidenceRepository {
        docs: RwLock<Vec<Evidence>>,
    }

    #[async_trait]
    impl EvidenceRepository for InMemoryEvidenceRepository {
        async fn insert(&self, mut evidence: Evidence) -> Result<ObjectId, ServiceError> {
            let id = ObjectId::new();
            evidence.id = Some(id);
            self.docs.write().await.push(evidence);
            Ok(id)
        }

        async fn find_by_payment(&self, payment_id: &str) -> Result<Option<Evidence>, ServiceError> {
            let docs = self.docs.read().await;
            Ok(docs.iter().rev().find(|e| e.payment_id == payment_id).cloned())
        }

        async fn delete_by_payment(&self, payment_id: &str) -> Result<u64, ServiceError> {
            let mut docs = self.docs.write().await;
            let before = docs.len();
            docs.retain(|e| e.payment_id != payment_id);
            Ok((before - docs.len()) as u64)
        }
    }
}
