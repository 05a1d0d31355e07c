pub mod id;
pub use self::id::{DatabaseId, Distance};

pub mod entry;
pub use self::entry::Entry;

pub mod error;
pub use self::error::Error;

pub mod message;
pub use self::message::{Message, Request, RequestMessage, Response, ResponseMessage};

pub mod peer;
pub use self::peer::{Key, NodeInfo, PeerEntry, PeerId, ID_LEN};
