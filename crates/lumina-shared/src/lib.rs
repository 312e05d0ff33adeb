//! # lumina-shared
//!
//! Types shared by every Lumina crate: the generic directory [`Record`] and
//! its identifiers, partial updates, the identity provider interface and the
//! photo encoder.

pub mod constants;
pub mod error;
pub mod identity;
pub mod patch;
pub mod photo;
pub mod record;
pub mod types;

pub use error::{IdentityError, ImageError, PatchError};
pub use identity::{IdentityProvider, Session, Subscription};
pub use patch::RecordPatch;
pub use photo::InlineImage;
pub use record::{Contact, Links, OrderedSet, Record};
pub use types::{Actor, ActorId, RecordId, RecordKind};
