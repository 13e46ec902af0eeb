//! Business flows built on the conversation engine: registration,
//! member and admin menus, invitations, the company directory and the
//! material catalogue with its publish and search flows.

pub mod admin;
pub mod catalogue;
pub mod companies;
pub mod geo;
pub mod invitations;
pub mod members;
pub mod publishing;
pub mod registration;
pub mod search;
pub mod services;
pub mod shared;

pub use catalogue::{Catalogue, Publication, PublicationType};
pub use companies::{Company, CompanyDirectory, Membership};
pub use geo::{Gazetteer, Geocoder, Location};
pub use invitations::{Invitation, InvitationKind, InvitationManager};
pub use services::Services;
pub use shared::Shared;
