//! External service integrations.

pub mod meta_ads_client {
    pub use crate::meta_ads_client::*;
}

pub mod meta_ads_models {
    pub use crate::meta_ads_models::*;
}

pub mod rest_storage {
    pub use crate::rest_storage::*;
}

pub mod webhook_models {
    pub use crate::webhook_models::*;
}
