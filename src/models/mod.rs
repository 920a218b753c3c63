pub mod clinical;
pub mod route;
pub mod session;

pub use clinical::ClinicalRecordForm;
pub use route::{RouteDescriptor, RouteMeta, RouteRecord};
pub use session::{Credentials, Profile, Session};
