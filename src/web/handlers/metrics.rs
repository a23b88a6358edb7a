use salvo::prelude::*;

use crate::metrics::{Metrics, format_prometheus};
use crate::web::web_state;

#[handler]
pub async fn metrics(res: &mut Response) {
    let snapshot = web_state().devices.correlator().snapshot();
    Metrics::set_ledger_sizes(
        snapshot.pending_waiters as u64,
        snapshot.early_finishes as u64,
    );
    res.render(Text::Plain(format_prometheus()));
}
