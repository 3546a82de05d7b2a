pub mod identity;
pub mod payment;
pub mod receipt;

pub use identity::Buyer;
pub use payment::{GatewayError, PaymentGateway};
pub use receipt::{ReceiptImage, ReceiptStore, UploadError};
