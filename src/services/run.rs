//! Sequential driver over the item routes.
//!
//! Each route call is isolated: a failure is logged and the next route still
//! runs, unless the plan asks to stop at the first failure.

use std::io::Write;

use thiserror::Error;
use tracing::{Instrument, error, info};

use super::items_api::{ApiError, ItemsApi, NewItem};
use crate::fetch::HttpClient;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Route {
    /// GET /data/items
    Items,
    /// GET /data/item/{id}
    Item,
    /// POST /data/item
    Create,
}

impl Route {
    pub const ALL: [Route; 3] = [Route::Items, Route::Item, Route::Create];

    pub fn label(self, item_id: &str) -> String {
        match self {
            Route::Items => "GET /data/items".to_string(),
            Route::Item => format!("GET /data/item/{item_id}"),
            Route::Create => "POST /data/item".to_string(),
        }
    }
}

/// What to call, in order.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub routes: Vec<Route>,
    pub item_id: String,
    pub new_item: NewItem,
    pub fail_fast: bool,
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("{label} failed: {source}")]
    Aborted {
        label: String,
        #[source]
        source: ApiError,
    },

    #[error("{failed} of {total} route calls failed")]
    Failed { failed: usize, total: usize },

    #[error("failed to write response: {0}")]
    Output(#[from] std::io::Error),
}

/// Calls every route in `plan`, echoing each response to `out`.
///
/// Returns the number of calls made when all succeeded.
pub async fn run_routes<C: HttpClient, W: Write>(
    api: &ItemsApi<C>,
    plan: &RunPlan,
    out: &mut W,
) -> Result<usize, RunError> {
    let total = plan.routes.len();
    let mut failed = 0;

    for &route in &plan.routes {
        let label = route.label(&plan.item_id);
        writeln!(out, "--- Accessing {label} ---")?;

        let span = tracing::info_span!("route", route = %label);
        let result = async {
            match route {
                Route::Items => api.list_items().await,
                Route::Item => api.get_item(&plan.item_id).await,
                Route::Create => api.create_item(&plan.new_item).await,
            }
        }
        .instrument(span)
        .await;

        match result {
            Ok(body) => {
                writeln!(out, "Response for {label}: {body}")?;
                writeln!(out)?;
            }
            Err(source) if plan.fail_fast => return Err(RunError::Aborted { label, source }),
            Err(e) => {
                error!(route = %label, error = ?anyhow::Error::new(e), "Route call failed");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(RunError::Failed { failed, total });
    }
    info!(total, "All route calls succeeded");
    Ok(total)
}
