use salvo::prelude::*;
use serde::Deserialize;
use serde_json::json;

use super::{render_adapter_error, render_error};
use crate::device::{DeviceProperties, PropertyValue};
use crate::web::web_state;

#[derive(Debug, Deserialize)]
struct WriteRequest {
    value: PropertyValue,
}

fn path_param(req: &Request, res: &mut Response, key: &str) -> Option<String> {
    match req.param::<String>(key) {
        Some(v) if !v.is_empty() => Some(v),
        _ => {
            render_error(
                res,
                StatusCode::BAD_REQUEST,
                &format!("missing {key} path parameter"),
            );
            None
        }
    }
}

#[handler]
pub async fn init_device(req: &mut Request, res: &mut Response) {
    let Some(device_id) = path_param(req, res, "id") else {
        return;
    };
    let properties = match req.parse_json::<DeviceProperties>().await {
        Ok(properties) => properties,
        Err(err) => {
            render_error(
                res,
                StatusCode::BAD_REQUEST,
                &format!("invalid device properties: {}", err),
            );
            return;
        }
    };

    match web_state()
        .devices
        .init_device(&device_id, &properties)
        .await
    {
        Ok(()) => {
            res.status_code(StatusCode::CREATED);
            res.render(Json(json!({
                "device": device_id,
                "properties": properties.len(),
            })));
        }
        Err(err) => render_adapter_error(res, &err),
    }
}

#[handler]
pub async fn write_property(req: &mut Request, res: &mut Response) {
    let Some(device_id) = path_param(req, res, "id") else {
        return;
    };
    let Some(property) = path_param(req, res, "name") else {
        return;
    };
    let body = match req.parse_json::<WriteRequest>().await {
        Ok(body) => body,
        Err(err) => {
            render_error(
                res,
                StatusCode::BAD_REQUEST,
                &format!("invalid property value: {}", err),
            );
            return;
        }
    };

    match web_state()
        .devices
        .write(&device_id, &property, &body.value)
        .await
    {
        Ok(()) => {
            res.render(Json(json!({
                "device": device_id,
                "property": property,
                "value": body.value,
            })));
        }
        Err(err) => render_adapter_error(res, &err),
    }
}

#[handler]
pub async fn read_property(req: &mut Request, res: &mut Response) {
    let Some(device_id) = path_param(req, res, "id") else {
        return;
    };
    let Some(property) = path_param(req, res, "name") else {
        return;
    };

    match web_state().devices.read(&device_id, &property).await {
        Ok(Some(value)) => {
            res.render(Json(json!({
                "device": device_id,
                "property": property,
                "value": value,
            })));
        }
        Ok(None) => render_error(res, StatusCode::NOT_FOUND, "property has no value"),
        Err(err) => render_adapter_error(res, &err),
    }
}
