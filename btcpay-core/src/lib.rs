pub mod event;
pub mod fixture;
pub mod invoice;
pub mod payment_request;
pub mod server;
