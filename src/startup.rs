use crate::auth::AdminAuth;
use crate::db::connection::DbPool;
use std::sync::Arc;
use tokio::time::{Duration, interval};
use tracing::error;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub auth: Arc<AdminAuth>,
}

impl AppState {
    pub fn new(db: DbPool, auth: AdminAuth) -> Self {
        let db_clone = db.clone();
        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                match db_clone.acquire().await {
                    Ok(conn) => {
                        drop(conn);
                    }
                    Err(e) => {
                        error!("Database connection health check failed: {}", e);
                    }
                }
            }
        });

        AppState {
            db,
            auth: Arc::new(auth),
        }
    }
}
