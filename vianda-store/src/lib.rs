pub mod app_config;
pub mod realtime;
pub mod receipts;

pub use realtime::RealtimeOrderStore;
pub use receipts::InMemoryReceiptStore;
