pub mod errors;
pub mod id;
pub mod models;
pub mod session;

pub use errors::{ConfigError, CourierError, RealtimeError};
pub use id::{new_id, new_temp_id, is_temp_id};
pub use models::{
    ContentKind, Conversation, DeliveryStatus, Message, MessageContent, PresenceStatus, Reaction,
    ReactionKind, UserProfile,
};
pub use session::SessionHandle;

pub type Result<T> = std::result::Result<T, CourierError>;
