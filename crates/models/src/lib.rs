//! Document types stored in MongoDB and the request/response shapes built on them.

pub mod errors;
pub mod db;
pub mod dates;
pub mod payment;
pub mod evidence;

pub use evidence::Evidence;
pub use payment::{Payment, PaymentCreateRequest, PaymentStatus, PaymentUpdateRequest, PaymentView};
