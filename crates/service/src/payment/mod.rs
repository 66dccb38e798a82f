//! Payments: query model, repository abstraction and the application service.

pub mod query;
pub mod repository;
pub mod service;

pub use query::PaymentQuery;
pub use repository::{MongoPaymentRepository, PaymentRepository};
pub use service::PaymentService;
