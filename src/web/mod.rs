use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use once_cell::sync::OnceCell;
use salvo::prelude::*;
use tracing::info;

use crate::adapter::DeviceStore;
use crate::config::GatewayConfig;

pub mod handlers;
pub mod router;

use self::router::create_router;

#[derive(Clone)]
pub struct WebState {
    pub devices: Arc<DeviceStore>,
    pub started_at: Instant,
}

static WEB_STATE: OnceCell<WebState> = OnceCell::new();

pub fn web_state() -> &'static WebState {
    WEB_STATE
        .get()
        .expect("web state is not initialized before handler execution")
}

/// Installs a web state backed by an in-memory scripted store, once per test binary.
#[cfg(test)]
pub(crate) fn init_test_state() -> &'static WebState {
    use crate::config::CorrelationConfig;
    use crate::store::testing::ScriptedStore;

    WEB_STATE.get_or_init(|| WebState {
        devices: Arc::new(DeviceStore::from_config(
            Arc::new(ScriptedStore::new()),
            &CorrelationConfig::default(),
        )),
        started_at: Instant::now(),
    })
}

#[derive(Clone)]
pub struct WebServer {
    config: GatewayConfig,
}

impl WebServer {
    pub fn new(config: GatewayConfig, devices: Arc<DeviceStore>) -> Self {
        let _ = WEB_STATE.set(WebState {
            devices,
            started_at: Instant::now(),
        });

        Self { config }
    }

    pub async fn start(&self) -> Result<()> {
        let bind_addr = format!("{}:{}", self.config.bind_address, self.config.port);
        info!("Starting web server on {}", bind_addr);

        let acceptor = TcpListener::new(bind_addr).bind().await;
        Server::new(acceptor).serve(create_router()).await;

        Ok(())
    }
}
