use async_trait::async_trait;
use futures_util::TryStreamExt;
use models::{db::PAYMENTS_COLLECTION, Payment, PaymentStatus};
use mongodb::{
    bson::{self, doc, oid::ObjectId},
    Collection, Database,
};

use crate::errors::ServiceError;
use crate::payment::query::PaymentQuery;

/// Persistence for payment documents.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn insert(&self, payment: Payment) -> Result<ObjectId, ServiceError>;
    async fn insert_many(&self, payments: Vec<Payment>) -> Result<usize, ServiceError>;
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Payment>, ServiceError>;
    /// `$set` every stored field except `_id`; returns whether a document matched.
    async fn replace_fields(&self, id: ObjectId, payment: Payment) -> Result<bool, ServiceError>;
    async fn delete(&self, id: ObjectId) -> Result<bool, ServiceError>;
    async fn set_status(&self, id: ObjectId, status: PaymentStatus) -> Result<bool, ServiceError>;
    /// Mark non-completed payments due on `today` as `due_now` and earlier ones as `overdue`.
    async fn refresh_statuses(&self, today: bson::DateTime) -> Result<u64, ServiceError>;
    /// Filtered page, newest due date first.
    async fn search(&self, query: &PaymentQuery) -> Result<Vec<Payment>, ServiceError>;
    async fn count(&self) -> Result<u64, ServiceError>;
}

/// MongoDB-backed repository over the `payments` collection.
#[derive(Clone)]
pub struct MongoPaymentRepository {
    collection: Collection<Payment>,
}

impl MongoPaymentRepository {
    pub fn new(db: &Database) -> Self {
        Self { collection: db.collection::<Payment>(PAYMENTS_COLLECTION) }
    }
}

#[async_trait]
impl PaymentRepository for MongoPaymentRepository {
    async fn insert(&self, payment: Payment) -> Result<ObjectId, ServiceError> {
        let res = self.collection.insert_one(&payment).await?;
        res.inserted_id
            .as_object_id()
            .ok_or_else(|| ServiceError::Db("inserted _id is not an ObjectId".into()))
    }

    async fn insert_many(&self, payments: Vec<Payment>) -> Result<usize, ServiceError> {
        if payments.is_empty() {
            return Ok(0);
        }
        let res = self.collection.insert_many(&payments).await?;
        Ok(res.inserted_ids.len())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Payment>, ServiceError> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    async fn replace_fields(&self, id: ObjectId, payment: Payment) -> Result<bool, ServiceError> {
        let mut fields = bson::to_document(&payment)?;
        fields.remove("_id");
        let res = self.collection.update_one(doc! { "_id": id }, doc! { "$set": fields }).await?;
        Ok(res.matched_count > 0)
    }

    async fn delete(&self, id: ObjectId) -> Result<bool, ServiceError> {
        let res = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(res.deleted_count > 0)
    }

    async fn set_status(&self, id: ObjectId, status: PaymentStatus) -> Result<bool, ServiceError> {
        let res = self
            .collection
            .update_one(doc! { "_id": id }, doc! { "$set": { "payee_payment_status": status.as_str() } })
            .await?;
        Ok(res.matched_count > 0)
    }

    async fn refresh_statuses(&self, today: bson::DateTime) -> Result<u64, ServiceError> {
        let open = doc! { "$ne": PaymentStatus::Completed.as_str() };
        let due_now = self
            .collection
            .update_many(
                doc! { "payee_due_date": today, "payee_payment_status": open.clone() },
                doc! { "$set": { "payee_payment_status": PaymentStatus::DueNow.as_str() } },
            )
            .await?;
        let overdue = self
            .collection
            .update_many(
                doc! { "payee_due_date": { "$lt": today }, "payee_payment_status": open },
                doc! { "$set": { "payee_payment_status": PaymentStatus::Overdue.as_str() } },
            )
            .await?;
        Ok(due_now.modified_count + overdue.modified_count)
    }

    async fn search(&self, query: &PaymentQuery) -> Result<Vec<Payment>, ServiceError> {
        let (skip, limit) = query.pagination.normalize();
        let cursor = self
            .collection
            .find(query.filter())
            .sort(doc! { "payee_due_date": -1 })
            .skip(skip)
            .limit(limit)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count(&self) -> Result<u64, ServiceError> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }
}

/// In-memory repository for tests and local runs without a database.
pub mod memory {
    use super::*;
    use tokio::sync::RwLock;

    #[derive(Default)]
    pub struct InMemoryPaymentRepository {
        docs: RwLock<Vec<Payment>>,
    }

    impl InMemoryPaymentRepository {
        pub async fn all(&self) -> Vec<Payment> {
            self.docs.read().await.clone()
        }
    }

    #[async_trait]
    impl PaymentRepository for InMemoryPaymentRepository {
        async fn insert(&self, mut payment: Payment) -> Result<ObjectId, ServiceError> {
            let id = ObjectId::new();
            payment.id = Some(id);
            self.docs.write().await.push(payment);
            Ok(id)
        }

        async fn insert_many(&self, payments: Vec<Payment>) -> Result<usize, ServiceError> {
            let mut docs = self.docs.write().await;
            let n = payments.len();
            for mut p in payments {
                p.id = Some(ObjectId::new());
                docs.push(p);
            }
            Ok(n)
        }

        async fn find_by_id(&self, id: ObjectId) -> Result<Option<Payment>, ServiceError> {
            Ok(self.docs.read().await.iter().find(|p| p.id == Some(id)).cloned())
        }

        async fn replace_fields(&self, id: ObjectId, mut payment: Payment) -> Result<bool, ServiceError> {
            let mut docs = self.docs.write().await;
            match docs.iter_mut().find(|p| p.id == Some(id)) {
                Some(slot) => {
                    payment.id = Some(id);
                    *slot = payment;
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn delete(&self, id: ObjectId) -> Result<bool, ServiceError> {
            let mut docs = self.docs.write().await;
            let before = docs.len();
            docs.retain(|p| p.id != Some(id));
            Ok(docs.len() != before)
        }

        async fn set_status(&self, id: ObjectId, status: PaymentStatus) -> Result<bool, ServiceError> {
            let mut docs = self.docs.write().await;
            match docs.iter_mut().find(|p| p.id == Some(id)) {
                Some(p) => {
                    p.payee_payment_status = status.as_str().to_string();
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn refresh_statuses(&self, today: bson::DateTime) -> Result<u64, ServiceError> {
            let mut docs = self.docs.write().await;
            let mut modified = 0;
            for p in docs.iter_mut().filter(|p| p.payee_payment_status != PaymentStatus::Completed.as_str()) {
                let next = if p.payee_due_date == today {
                    PaymentStatus::DueNow
                } else if p.payee_due_date < today {
                    PaymentStatus::Overdue
                } else {
                    continue;
                };
                if p.payee_payment_status != next.as_str() {
                    p.payee_payment_status = next.as_str().to_string();
                    modified += 1;
                }
            }
            Ok(modified)
        }

        async fn search(&self, query: &PaymentQuery) -> Result<Vec<Payment>, ServiceError> {
            let (skip, limit) = query.pagination.normalize();
            let mut hits: Vec<Payment> = self.docs.read().await.iter().filter(|p| query.matches(p)).cloned().collect();
            hits.sort_by(|a, b| b.payee_due_date.cmp(&a.payee_due_date));
            Ok(hits.into_iter().skip(skip as usize).take(limit as usize).collect())
        }

        async fn count(&self) -> Result<u64, ServiceError> {
            Ok(self.docs.read().await.len() as u64)
        }
    }
}
