//! Periodic processing of the newest input workbook
//!
//! A single sequential loop: run, log, sleep. A cycle never starts before
//! the previous one has finished, so the loop cannot overlap with itself.

use tracing::{error, info, warn};

use crate::models::ProcessingResult;
use crate::AppState;

/// Loop forever, processing the latest workbook every poll interval
pub async fn run_background_loop(state: AppState) {
    let interval = state.settings.poll_interval();
    info!(
        "Background runner started. Checking every {} minutes.",
        state.settings.poll_interval_minutes
    );

    loop {
        run_once(&state).await;
        tokio::time::sleep(interval).await;
    }
}

/// One cycle; publishes only when storefront credentials are configured
pub async fn run_once(state: &AppState) -> Option<ProcessingResult> {
    let publish = state.publisher.is_some();
    let processor = match state.processor(publish) {
        Ok(processor) => processor,
        Err(e) => {
            warn!(error = %e, "Background runner aborted");
            return None;
        }
    };

    match processor.process_latest().await {
        Ok(Some(result)) => {
            if result.is_clean() {
                info!(
                    run_id = %result.run_id,
                    processed = result.processed_rows,
                    skipped = result.skipped_rows,
                    "Background run completed"
                );
            } else {
                warn!(
                    run_id = %result.run_id,
                    processed = result.processed_rows,
                    skipped = result.skipped_rows,
                    errors = result.errors.len(),
                    "Background run completed with row errors"
                );
            }
            Some(result)
        }
        Ok(None) => None,
        Err(e) => {
            error!(error = %e, "Background runner encountered an error");
            None
        }
    }
}
