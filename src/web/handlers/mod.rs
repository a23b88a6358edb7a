use salvo::prelude::*;
use serde_json::json;

use crate::error::AdapterError;
use crate::store::StoreError;

pub mod devices;
pub mod health;
pub mod metrics;
pub mod notifications;

fn render_error(res: &mut Response, status: StatusCode, message: &str) {
    res.status_code(status);
    res.render(Json(json!({ "error": message })));
}

fn adapter_error_status(err: &AdapterError) -> StatusCode {
    match err {
        AdapterError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
        AdapterError::DuplicateDelayToken(_) => StatusCode::CONFLICT,
        AdapterError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        AdapterError::Store(StoreError::Connection(_)) => StatusCode::SERVICE_UNAVAILABLE,
        AdapterError::Store(_) => StatusCode::BAD_GATEWAY,
        AdapterError::WaiterDropped(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn render_adapter_error(res: &mut Response, err: &AdapterError) {
    render_error(res, adapter_error_status(err), &err.to_string());
}
