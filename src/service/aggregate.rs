use crate::models::aggregation::{
    Aggregation, AggregationPolicy, FailurePolicy, SourceReport, SourceResult,
};
use crate::models::backup_row::UnifiedBackupRow;
use crate::models::error::{DashboardError, Result};
use crate::service::sources::RowSource;
use log::{debug, error, info, warn};

async fn collect<S: RowSource>(source: &S) -> SourceResult {
    match source.fetch().await {
        Ok(rows) => SourceResult::Ok(rows),
        Err(e) => SourceResult::Failed(e.to_string()),
    }
}

/// Fetch all three sources concurrently and merge them.
///
/// Rows are concatenated CSV first, then Datto, then Acronis, and rows
/// without a status are dropped. A failed source is handled according to
/// `policy`: `Degrade` substitutes an empty list, `AbortAll` fails the whole
/// load.
pub async fn load_all<C, D, A>(
    csv: &C,
    datto: &D,
    acronis: &A,
    policy: &AggregationPolicy,
) -> Result<Aggregation>
where
    C: RowSource,
    D: RowSource,
    A: RowSource,
{
    let (csv_result, datto_result, acronis_result) =
        tokio::join!(collect(csv), collect(datto), collect(acronis));

    let results = [
        (csv.kind(), csv_result),
        (datto.kind(), datto_result),
        (acronis.kind(), acronis_result),
    ];

    let mut rows: Vec<UnifiedBackupRow> = Vec::new();
    let mut reports = Vec::with_capacity(results.len());

    for (kind, result) in results {
        match result {
            SourceResult::Ok(source_rows) => {
                debug!("{} returned {} rows", kind, source_rows.len());
                reports.push(SourceReport::loaded(kind, source_rows.len()));
                rows.extend(source_rows);
            }
            SourceResult::Failed(reason) => match policy.for_source(kind) {
                FailurePolicy::AbortAll => {
                    error!("Error loading {} data: {}", kind, reason);
                    return Err(DashboardError::SourceAborted {
                        provider: kind,
                        reason,
                    });
                }
                FailurePolicy::Degrade => {
                    warn!("Error fetching {} data, continuing without it: {}", kind, reason);
                    reports.push(SourceReport::failed(kind, reason));
                }
            },
        }
    }

    let fetched = rows.len();
    rows.retain(UnifiedBackupRow::has_status);
    info!(
        "Aggregated {} rows ({} dropped without a status)",
        rows.len(),
        fetched - rows.len()
    );

    Ok(Aggregation { rows, reports })
}
