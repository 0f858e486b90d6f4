//! Row structs for the PostgreSQL tables and their conversions to domain types.
//!
//! Status and pricing columns are stored as text; decoding a value the domain
//! does not know yields `DbError::CorruptRow`.

pub mod assignment;
pub mod event;
pub mod mission;
pub mod participant;
pub mod ride;

pub use assignment::ResourceAssignmentRow;
pub use event::EventRow;
pub use mission::MissionRow;
pub use participant::ParticipantRow;
pub use ride::RideRow;
