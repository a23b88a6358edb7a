use salvo::prelude::*;

use crate::web::handlers::{
    devices::{init_device, read_property, write_property},
    health::health_check,
    metrics::metrics,
    notifications::finished_processing,
};

pub fn create_router() -> Router {
    Router::new()
        .push(Router::with_path("health").get(health_check))
        .push(Router::with_path("metrics").get(metrics))
        .push(Router::with_path("notifications").post(finished_processing))
        .push(
            Router::with_path("devices/{id}")
                .put(init_device)
                .push(
                    Router::with_path("properties/{name}")
                        .get(read_property)
                        .put(write_property),
                ),
        )
}
