pub mod assignment;
pub mod event;
pub mod mission;
pub mod participant;
pub mod ride;
pub mod status;
pub mod subtree;

pub use assignment::{AssignmentOwner, ResourceAssignment, ResourceKind, ResourceRef};
pub use event::{Event, NewEvent, Pricing, PricingType};
pub use mission::{Mission, MissionUpdate, NewMission};
pub use participant::Participant;
pub use ride::{NewRide, Ride};
pub use status::{
    AssignmentStatus, EventStatus, MissionStatus, ParticipantStatus, RideStatus, Terminal,
};
pub use subtree::EventSubtree;
