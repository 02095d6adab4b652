pub mod ci_string;
pub mod error;
pub mod ids;
pub mod model;

pub use ci_string::CiString;
pub use error::StoreError;
pub use model::{
    Attachment, ChangeReason, Email, Event, EventChanged, EventStatus, MailSnapshot,
};
