use crate::auth::JwtVerifier;
use crate::config::Config;
use crate::media::{FastStart, MediaProber};
use crate::storage::{LocalAssets, ObjectStorage};
use crate::store::VideoStore;
use std::sync::Arc;

/// Everything a handler needs, shared through an `Extension` layer.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub videos: Arc<dyn VideoStore>,
    pub assets: LocalAssets,
    pub objects: ObjectStorage,
    pub prober: Arc<dyn MediaProber>,
    pub remuxer: Arc<dyn FastStart>,
    pub verifier: JwtVerifier,
}

impl AppState {
    pub fn new(
        config: Config,
        videos: Arc<dyn VideoStore>,
        objects: ObjectStorage,
        prober: Arc<dyn MediaProber>,
        remuxer: Arc<dyn FastStart>,
    ) -> Self {
        Self {
            assets: LocalAssets::new(&config.assets_root, config.port),
            verifier: JwtVerifier::new(&config.jwt_secret),
            config: Arc::new(config),
            videos,
            objects,
            prober,
            remuxer,
        }
    }
}
