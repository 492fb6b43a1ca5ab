//! Platform cache sweep.
//!
//! Runs after device-level cleanup. Every sub-step has its own failure
//! boundary: an absent capability is recorded as unavailable, an error as a
//! failed step, and the sweep always moves on to the next sub-step.

use crate::domain::platform::{
    NameFilter, PairingRecord, PlatformCaches, Probe, ProbeResult, StorageScope,
};
use crate::domain::report::{SweepReport, SweepStatus, SweepStepKind};
use futures::future::join_all;
use tracing::{debug, info, warn};

/// Name filters applied during the sweep.
#[derive(Debug, Clone)]
pub struct SweepFilters {
    pub storage_keys: NameFilter,
    pub databases: NameFilter,
}

fn settle<T>(
    kind: &SweepStepKind,
    result: ProbeResult<T>,
    affected: impl FnOnce(&T) -> usize,
) -> (SweepStatus, Option<T>) {
    match result {
        Ok(Probe::Supported(value)) => (
            SweepStatus::Completed {
                affected: affected(&value),
            },
            Some(value),
        ),
        Ok(Probe::Unsupported) => {
            debug!("Skipping {}: unavailable on this platform", kind);
            (SweepStatus::Unavailable, None)
        }
        Err(e) => {
            warn!("Sweep step {} failed: {}", kind, e);
            (
                SweepStatus::Failed {
                    reason: e.to_string(),
                },
                None,
            )
        }
    }
}

/// Run every sweep sub-step against `platform`.
pub async fn sweep_platform(platform: &dyn PlatformCaches, filters: &SweepFilters) -> SweepReport {
    let mut report = SweepReport::default();

    sweep_pairings(platform, &mut report).await;

    for scope in StorageScope::ALL {
        let kind = SweepStepKind::PersistedKeys { scope };
        let result = platform
            .purge_matching_persisted_keys(scope, &filters.storage_keys)
            .await;
        let (status, _) = settle(&kind, result, |removed| *removed);
        report.record(kind, status);
    }

    let kind = SweepStepKind::StructuredCaches;
    let (status, _) = settle(&kind, platform.purge_structured_caches().await, |n| *n);
    report.record(kind, status);

    sweep_databases(platform, &filters.databases, &mut report).await;

    info!(
        "Platform sweep finished: {} step(s), {} unavailable, {} failed",
        report.steps.len(),
        report.unavailable_count(),
        report.failed_steps().count()
    );
    report
}

async fn sweep_pairings(platform: &dyn PlatformCaches, report: &mut SweepReport) {
    let kind = SweepStepKind::ListPairings;
    let records = match platform.list_cached_pairings().await {
        Ok(Probe::Supported(records)) => {
            report.record(
                kind,
                SweepStatus::Completed {
                    affected: records.len(),
                },
            );
            records
        }
        Ok(Probe::Unsupported) => {
            debug!("Pairing cache unavailable on this platform");
            report.record(kind, SweepStatus::Unavailable);
            return;
        }
        // Enumeration failing means the cache is unreachable, not that a
        // record could not be purged.
        Err(e) => {
            warn!("Could not enumerate cached pairings: {}", e);
            report.record(kind, SweepStatus::Unavailable);
            return;
        }
    };

    let outcomes = join_all(records.iter().map(|record| sweep_record(platform, record))).await;
    for steps in outcomes {
        for (kind, status) in steps {
            report.record(kind, status);
        }
    }
}

async fn sweep_record(
    platform: &dyn PlatformCaches,
    record: &PairingRecord,
) -> Vec<(SweepStepKind, SweepStatus)> {
    let disconnect = SweepStepKind::DisconnectPairing {
        name: record.name.clone(),
    };
    let (disconnect_status, _) = settle(
        &disconnect,
        platform.disconnect_if_live(record).await,
        |closed| usize::from(*closed),
    );

    let forget = SweepStepKind::ForgetPairing {
        name: record.name.clone(),
    };
    let (forget_status, _) = settle(&forget, platform.forget_if_supported(record).await, |_| 1);

    vec![(disconnect, disconnect_status), (forget, forget_status)]
}

async fn sweep_databases(
    platform: &dyn PlatformCaches,
    filter: &NameFilter,
    report: &mut SweepReport,
) {
    let kind = SweepStepKind::ListDatabases;
    let (status, names) = settle(&kind, platform.list_structured_databases().await, |n| {
        n.len()
    });
    report.record(kind, status);

    let Some(names) = names else {
        return;
    };
    let matching: Vec<String> = names.into_iter().filter(|n| filter.matches(n)).collect();

    let deletions = join_all(matching.iter().map(|name| async move {
        let kind = SweepStepKind::DeleteDatabase { name: name.clone() };
        let (status, _) = settle(&kind, platform.delete_database(name).await, |_| 1);
        (kind, status)
    }))
    .await;
    for (kind, status) in deletions {
        report.record(kind, status);
    }
}
