use crate::kubernetes::Orchestrator;
use crate::loki::TailProber;
use crate::queue::JobQueue;
use crate::types::PodRecord;
use crate::utils::{format_latency, is_target_namespace};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Counts from one pass over the queue.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    pub confirmed: usize,
    pub failed: usize,
}

/// List every namespace matching `prefix` and enqueue pods that have started but are
/// neither confirmed nor already pending. Returns how many records were enqueued.
///
/// Listing errors are returned as-is; the caller treats them as fatal.
pub async fn discover<O>(orchestrator: &O, prefix: &str, queue: &mut JobQueue) -> anyhow::Result<usize>
where
    O: Orchestrator + ?Sized,
{
    let mut enqueued = 0;
    for namespace in orchestrator.list_namespaces().await? {
        if !is_target_namespace(&namespace, prefix) {
            continue;
        }

        for pod in orchestrator.list_pods(&namespace).await? {
            let Some(start_time) = pod.start_time else {
                debug!("Pod {}/{} has no start time yet", namespace, pod.name);
                continue;
            };
            let record = PodRecord {
                namespace: namespace.clone(),
                pod_name: pod.name,
                start_time,
            };
            if queue.is_confirmed(&record) || queue.is_pending(&record) {
                continue;
            }
            debug!("NEW POD: {}", record.key());
            queue.enqueue(record);
            enqueued += 1;
        }
    }
    Ok(enqueued)
}

/// Probe every queued record in FIFO order, one at a time, until the queue is empty.
/// Failed records are dropped; discovery re-adds them next cycle.
pub async fn drain<P>(prober: &P, queue: &mut JobQueue) -> DrainReport
where
    P: TailProber + ?Sized,
{
    let mut report = DrainReport::default();
    while let Some(record) = queue.dequeue() {
        match prober.probe(&record).await {
            Ok(confirmation) => {
                debug!(
                    "Confirmed {} after {} with {} entries",
                    record.key(),
                    format_latency(confirmation.latency),
                    confirmation.entries
                );
                queue.mark_confirmed(&record);
                report.confirmed += 1;
            }
            Err(e) => {
                warn!(
                    "Error getting logs for pod {} in namespace {}: {}",
                    record.pod_name, record.namespace, e
                );
                report.failed += 1;
            }
        }
    }
    report
}

/// One discovery pass followed by a full drain.
pub async fn run_cycle<O, P>(
    orchestrator: &O,
    prober: &P,
    prefix: &str,
    queue: &mut JobQueue,
) -> anyhow::Result<DrainReport>
where
    O: Orchestrator + ?Sized,
    P: TailProber + ?Sized,
{
    let discovered = discover(orchestrator, prefix, queue).await?;
    if queue.is_empty() {
        debug!("No pods waiting for a tail probe");
    } else {
        debug!("{} pods waiting for a tail probe", queue.len());
    }
    let report = drain(prober, queue).await;
    info!(
        "Cycle done: {} discovered, {} confirmed, {} failed, {} confirmed in total",
        discovered,
        report.confirmed,
        report.failed,
        queue.confirmed_count()
    );
    Ok(report)
}

/// Run cycles forever, sleeping `interval` after each one. With `once`, stop after the
/// first cycle. Only a listing failure ends the loop.
pub async fn run<O, P>(
    orchestrator: &O,
    prober: &P,
    prefix: &str,
    interval: Duration,
    once: bool,
) -> anyhow::Result<()>
where
    O: Orchestrator + ?Sized,
    P: TailProber + ?Sized,
{
    let mut queue = JobQueue::new();
    loop {
        run_cycle(orchestrator, prober, prefix, &mut queue).await?;
        if once {
            return Ok(());
        }
        tokio::time::sleep(interval).await;
    }
}
