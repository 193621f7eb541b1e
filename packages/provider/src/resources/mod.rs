//! Managed resource types.

pub mod alert;
pub mod endpoint;
pub mod user;
pub mod validation;

use std::sync::Arc;

use crate::provider::Resource;

pub use alert::AlertResource;
pub use endpoint::EndpointResource;
pub use user::UserResource;

/// Every resource the provider registers.
pub fn all() -> Vec<Arc<dyn Resource>> {
    vec![
        Arc::new(AlertResource),
        Arc::new(EndpointResource),
        Arc::new(UserResource),
    ]
}
