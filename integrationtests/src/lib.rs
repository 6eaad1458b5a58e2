pub mod btcpaymock;
pub mod setup;
