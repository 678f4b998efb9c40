//! Mail
//!
//! Message envelope construction and the Gmail `users.messages.send` call.

pub mod message;
pub mod transport;

pub use message::MailMessage;
pub use transport::{GmailTransport, SendReceipt, GMAIL_API_BASE};
