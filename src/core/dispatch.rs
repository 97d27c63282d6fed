use crate::core::acquire::{fetch_event_image, AcquisitionParams};
use crate::io::fetch::FetchClient;
use crate::io::imagery::ImageryBackend;
use crate::types::{FetchOutcome, FireEvent, PyroError, PyroResult};
use std::path::Path;
use std::sync::mpsc;

/// Fan the per-event fetch out over a bounded worker pool.
///
/// All N tasks are submitted eagerly to a pool of exactly `max_workers`
/// threads; the pool lives only for the duration of this call. Outcomes are
/// collected in completion order, so `result[i]` does not correspond to
/// `events[i]` — callers get exactly N outcomes, nothing more. There is no
/// per-task timeout and no retry: the batch returns once every submitted
/// task has finished, slow outliers included.
pub fn fetch_event_batch<B: ImageryBackend + ?Sized>(
    backend: &B,
    client: &FetchClient,
    events: &[FireEvent],
    output_dir: &Path,
    params: &AcquisitionParams,
    max_workers: usize,
) -> PyroResult<Vec<FetchOutcome>> {
    // rayon treats 0 as "pick a default"; the worker count is an explicit
    // knob here, so an absent value is a caller bug
    if max_workers == 0 {
        return Err(PyroError::Processing(
            "Worker count must be at least 1".to_string(),
        ));
    }

    log::info!(
        "Dispatching {} fire events across {} workers",
        events.len(),
        max_workers
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(max_workers)
        .build()
        .map_err(|e| PyroError::Processing(format!("Failed to build worker pool: {}", e)))?;

    let (tx, rx) = mpsc::channel();

    pool.scope(|scope| {
        for event in events {
            let tx = tx.clone();
            scope.spawn(move |_| {
                let outcome = fetch_event_image(backend, client, event, output_dir, params);
                // The receiver outlives the scope; a send cannot fail here
                let _ = tx.send(outcome);
            });
        }
    });
    drop(tx);

    let outcomes: Vec<FetchOutcome> = rx.into_iter().collect();

    let saved = outcomes.iter().filter(|o| o.is_saved()).count();
    log::info!(
        "Batch complete: {} saved, {} without a file",
        saved,
        outcomes.len() - saved
    );

    Ok(outcomes)
}
