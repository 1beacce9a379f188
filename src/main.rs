mod store;

use pharma_scan::{AppConfig, Catalog, ScanResult, ocr, scan_document};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use store::{ScanStore, StoredScan};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Source path, scan uid and what the scan produced.
type ScanOutcome = (String, String, pharma_scan::error::Result<ScanResult>);

const CONFIG_PATH: &str = ".config/pharma_scan.toml";

const USAGE: &str = "usage:
  pharma-scan import-catalog <catalog.json>
  pharma-scan scan <payload.json>...
  pharma-scan show <scan-uid>
  pharma-scan stats";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // init tracing
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter("info")
        .init();

    let cfg = AppConfig::load_or_default(CONFIG_PATH)?;
    if let Some(dir) = Path::new(&cfg.db_path).parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    let db = ScanStore::new(&cfg.db_path)?;

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("import-catalog") => {
            let Some(path) = args.get(2) else {
                return Err(USAGE.into());
            };
            let bytes = tokio::fs::read(path).await?;
            let catalog = Catalog::from_json(&bytes)?;
            let products: Vec<_> = catalog.products().cloned().collect();
            db.import_products(&products)?;
        }
        Some("scan") => {
            if args.len() < 3 {
                return Err(USAGE.into());
            }
            scan_files(&db, cfg, &args[2..]).await?;
        }
        Some("show") => {
            let Some(uid) = args.get(2) else {
                return Err(USAGE.into());
            };
            match db.get_scan_by_uid(uid)? {
                Some(scan) => {
                    info!(
                        uid = %scan.uid,
                        file = %scan.source_file,
                        report_type = %scan.report_type,
                        strategy = ?scan.strategy,
                        items = scan.item_count,
                        "Stored scan"
                    );
                    println!("{}", scan.items_json);
                }
                None => warn!(uid = %uid, "No such scan"),
            }
        }
        Some("stats") => {}
        _ => return Err(USAGE.into()),
    }

    // Print statistics
    let (products, scans, empty_scans) = db.get_counts()?;
    info!(
        products = products,
        scans_total = scans,
        scans_empty = empty_scans,
        "Database statistics"
    );

    Ok(())
}

/// Scan payload files concurrently on the blocking pool and store the results.
async fn scan_files(
    db: &ScanStore,
    cfg: AppConfig,
    paths: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Arc::new(db.load_catalog()?);
    if catalog.is_empty() {
        warn!("Catalog is empty, every line will be dropped; run import-catalog first");
    }
    let scan_cfg = Arc::new(cfg.scan);

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling scans");
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }

    let mut set: JoinSet<ScanOutcome> = JoinSet::new();
    for path in paths {
        let bytes = tokio::fs::read(path).await?;
        let path = path.clone();
        let catalog = catalog.clone();
        let scan_cfg = scan_cfg.clone();
        let cancel = cancel.clone();

        set.spawn_blocking(move || {
            let uid = ScanStore::generate_uid(&bytes);
            let span = tracing::info_span!("payload", file = %path);
            let _enter = span.enter();
            let outcome = ocr::parse_payload(&bytes)
                .and_then(|doc| scan_document(&doc, &catalog, &scan_cfg, &*cancel));
            (path, uid, outcome)
        });
    }

    store_outcomes(db, &mut set).await?;
    Ok(())
}

/// Store every finished scan; a task that panicked is logged and skipped.
async fn store_outcomes(
    db: &ScanStore,
    set: &mut JoinSet<ScanOutcome>,
) -> Result<usize, Box<dyn std::error::Error>> {
    let mut stored = 0;
    while let Some(joined) = set.join_next().await {
        let (path, uid, outcome) = match joined {
            Ok(done) => done,
            Err(e) => {
                error!(error = %e, "Scan task failed");
                continue;
            }
        };
        match outcome {
            Ok(result) => {
                log_result(&path, &result);
                db.upsert_scan(&StoredScan {
                    uid,
                    source_file: path,
                    report_type: result.report_type.to_string(),
                    strategy: result.strategy.map(|s| s.to_string()),
                    item_count: result.lines.len(),
                    items_json: serde_json::to_string(&result.lines)?,
                })?;
                stored += 1;
            }
            Err(e) => error!(file = %path, error = %e, "Scan failed"),
        }
    }
    Ok(stored)
}

fn log_result(path: &str, result: &ScanResult) {
    info!(
        file = %path,
        report_type = %result.report_type,
        strategy = ?result.strategy,
        items = result.lines.len(),
        "SCANNED"
    );
    for sale in &result.lines {
        info!(
            barcode = %sale.line.barcode,
            product = %sale.product_name,
            quantity = sale.line.quantity,
            total = ?sale.line.total,
            confidence = sale.line.confidence,
            "Item"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharma_scan::ReportType;

    #[tokio::test]
    async fn test_panicked_scan_does_not_drop_others() {
        let db = ScanStore::new(":memory:").unwrap();
        let mut set: JoinSet<ScanOutcome> = JoinSet::new();
        set.spawn_blocking(|| panic!("scan task crashed"));
        set.spawn_blocking(|| {
            let result = ScanResult {
                report_type: ReportType::Unknown,
                strategy: None,
                lines: vec![],
            };
            ("b.json".to_string(), ScanStore::generate_uid(b"b"), Ok(result))
        });

        let stored = store_outcomes(&db, &mut set).await.unwrap();
        assert_eq!(stored, 1);
        let scan = db
            .get_scan_by_uid(&ScanStore::generate_uid(b"b"))
            .unwrap()
            .unwrap();
        assert_eq!(scan.source_file, "b.json");
    }
}
