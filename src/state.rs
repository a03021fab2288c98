use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::cache::ListingCache;
use crate::config::Config;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub listing_cache: ListingCache,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        let listing_cache = ListingCache::new(config.listing.cache_ttl_secs);
        Self {
            db,
            config,
            listing_cache,
        }
    }
}
