use std::future::Future;

use fleetdash_api::{FleetClient, User};

use crate::error::CoreError;

/// Destination for user-profile writes.
pub trait ProfileStore: Send + Sync + 'static {
    /// Replace the stored user and return the server's copy.
    fn update_user(&self, user: &User) -> impl Future<Output = Result<User, CoreError>> + Send;
}

impl ProfileStore for FleetClient {
    async fn update_user(&self, user: &User) -> Result<User, CoreError> {
        Ok(FleetClient::update_user(self, user).await?)
    }
}
