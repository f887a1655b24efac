pub mod notification;

pub use notification::{BodyEncoding, NotificationRequest, REQUIRED_FIELDS};
