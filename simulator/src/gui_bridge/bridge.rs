use crate::gui_bridge::model::OverlayModel;
use anyhow::Result;
use std::{
    net::SocketAddr,
    sync::{Arc, RwLock},
    thread,
};
use tokio::runtime::Builder;
use warp::Filter;

pub fn gui_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

/// Holds the latest overlay state and optionally serves it to a presentation
/// client over HTTP.
pub struct GuiBridge {
    state: Arc<RwLock<OverlayModel>>,
}

fn routes(
    state: Arc<RwLock<OverlayModel>>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let state_filter = warp::any().map(move || state.clone());

    let overlay = warp::path("overlay")
        .and(warp::get())
        .and(state_filter)
        .map(|state: Arc<RwLock<OverlayModel>>| {
            let model = match state.read() {
                Ok(guard) => guard.clone(),
                Err(poisoned) => poisoned.into_inner().clone(),
            };
            warp::reply::json(&model)
        });

    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::json(&serde_json::json!({"status": "ok"})));

    overlay.or(health)
}

impl GuiBridge {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(OverlayModel::default())),
        }
    }

    /// Serves `GET /overlay` on a background thread.
    pub fn serve(&self, addr: SocketAddr) {
        let routes = routes(self.state.clone());
        thread::spawn(move || {
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    eprintln!("overlay bridge runtime failed: {}", err);
                    return;
                }
            };
            runtime.block_on(async move {
                warp::serve(routes).run(addr).await;
            });
        });
    }

    pub fn publish(&self, model: &OverlayModel) -> Result<()> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| anyhow::anyhow!("overlay state poisoned"))?;
        *guard = model.clone();
        println!(
            "[GUI] round {}: {} ({:?})",
            guard.round,
            guard.instruction,
            guard.classification
        );
        Ok(())
    }

    pub fn publish_status(&self, message: &str) {
        println!("[GUI] {}", message);
    }

    pub fn snapshot(&self) -> OverlayModel {
        match self.state.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Default for GuiBridge {
    fn default() -> Self {
        Self::new()
    }
}
