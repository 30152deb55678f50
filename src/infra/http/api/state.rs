use std::sync::Arc;

use crate::application::songs::SongService;

#[derive(Clone)]
pub struct ApiState {
    pub songs: Arc<SongService>,
}

impl ApiState {
    pub fn new(songs: Arc<SongService>) -> Self {
        Self { songs }
    }
}
