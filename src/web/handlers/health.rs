use salvo::prelude::*;
use serde_json::json;

use crate::web::web_state;

#[handler]
pub async fn health_check(res: &mut Response) {
    let state = web_state();
    let snapshot = state.devices.correlator().snapshot();

    res.render(Json(json!({
        "status": "ok",
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
        "pending_waiters": snapshot.pending_waiters,
        "early_finishes": snapshot.early_finishes,
    })));
}
