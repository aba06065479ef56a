use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{config::AppConfig, security::token::TokenCodec};

/// Shared handles cloned into every request.
///
/// The connection sits behind an `Arc`: `DatabaseConnection` is not `Clone` when
/// sea-orm's `mock` backend is compiled in.
#[derive(Clone)]
pub struct AppState {
    pub orm: Arc<DatabaseConnection>,
    pub tokens: Arc<TokenCodec>,
}

impl AppState {
    pub fn new(orm: DatabaseConnection, config: &AppConfig) -> Self {
        Self {
            orm: Arc::new(orm),
            tokens: Arc::new(TokenCodec::new(&config.jwt_secret, config.token_ttl_hours)),
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.orm
    }
}
