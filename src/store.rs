use pharma_scan::{Barcode, Catalog, Product};
use rusqlite::{Connection, Result as SqliteResult, params};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{info, warn};

pub struct ScanStore {
    conn: Connection,
}

/// One scanned payload and what came out of it.
#[derive(Debug)]
pub struct StoredScan {
    pub uid: String,
    pub source_file: String,
    pub report_type: String,
    pub strategy: Option<String>,
    pub item_count: usize,
    pub items_json: String,
}

impl ScanStore {
    /// Open (or create) the scan database
    pub fn new<P: AsRef<Path>>(db_path: P) -> SqliteResult<Self> {
        let conn = Connection::open(db_path)?;

        // Catalog snapshot
        conn.execute(
            "CREATE TABLE IF NOT EXISTS products (
                barcode TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                cost REAL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS scan_reports (
                uid TEXT PRIMARY KEY,
                source_file TEXT NOT NULL,
                report_type TEXT NOT NULL,
                strategy TEXT,
                item_count INTEGER NOT NULL DEFAULT 0,
                items_json TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_scan_reports_report_type ON scan_reports(report_type)",
            [],
        )?;

        info!("Database initialized successfully");
        Ok(Self { conn })
    }

    /// Scan uid: SHA-256 of the payload, so re-scanning a payload replaces
    /// its earlier result.
    pub fn generate_uid(payload: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(payload);
        format!("{:x}", hasher.finalize())
    }

    /// Replace the catalog snapshot with `products`.
    pub fn import_products(&self, products: &[Product]) -> SqliteResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM products", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO products (barcode, name, cost) VALUES (?1, ?2, ?3)
                 ON CONFLICT(barcode) DO UPDATE SET
                    name = excluded.name,
                    cost = excluded.cost,
                    updated_at = CURRENT_TIMESTAMP",
            )?;
            for p in products {
                stmt.execute(params![p.barcode.as_str(), p.name, p.cost])?;
            }
        }
        tx.commit()?;
        info!(products = products.len(), "Catalog imported");
        Ok(products.len())
    }

    /// Load the catalog snapshot handed to every scan.
    pub fn load_catalog(&self) -> SqliteResult<Catalog> {
        let mut stmt = self
            .conn
            .prepare("SELECT barcode, name, cost FROM products")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                ))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let products = rows.into_iter().filter_map(|(barcode, name, cost)| {
            match Barcode::parse(&barcode) {
                Some(barcode) => Some(Product { barcode, name, cost }),
                None => {
                    warn!(barcode = %barcode, "Skipping stored product with invalid barcode");
                    None
                }
            }
        });
        Ok(Catalog::new(products))
    }

    /// Insert or update a scan result
    pub fn upsert_scan(&self, scan: &StoredScan) -> SqliteResult<()> {
        self.conn.execute(
            "INSERT INTO scan_reports
                (uid, source_file, report_type, strategy, item_count, items_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(uid) DO UPDATE SET
                source_file = excluded.source_file,
                report_type = excluded.report_type,
                strategy = excluded.strategy,
                item_count = excluded.item_count,
                items_json = excluded.items_json",
            params![
                scan.uid,
                scan.source_file,
                scan.report_type,
                scan.strategy,
                scan.item_count,
                scan.items_json,
            ],
        )?;
        info!(uid = %scan.uid, items = scan.item_count, "Scan stored");
        Ok(())
    }

    pub fn get_scan_by_uid(&self, uid: &str) -> SqliteResult<Option<StoredScan>> {
        let mut stmt = self.conn.prepare(
            "SELECT uid, source_file, report_type, strategy, item_count, items_json
             FROM scan_reports
             WHERE uid = ?1",
        )?;
        let mut rows = stmt.query(params![uid])?;
        match rows.next()? {
            Some(row) => Ok(Some(StoredScan {
                uid: row.get(0)?,
                source_file: row.get(1)?,
                report_type: row.get(2)?,
                strategy: row.get(3)?,
                item_count: row.get(4)?,
                items_json: row.get(5)?,
            })),
            None => Ok(None),
        }
    }

    /// Products, scans, and scans that yielded no items.
    pub fn get_counts(&self) -> SqliteResult<(usize, usize, usize)> {
        let products: usize = self
            .conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;

        let scans: usize = self
            .conn
            .query_row("SELECT COUNT(*) FROM scan_reports", [], |row| row.get(0))?;

        let empty_scans: usize = self.conn.query_row(
            "SELECT COUNT(*) FROM scan_reports WHERE item_count = 0",
            [],
            |row| row.get(0),
        )?;

        Ok((products, scans, empty_scans))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(barcode: &str, name: &str) -> Product {
        Product {
            barcode: Barcode::parse(barcode).unwrap(),
            name: name.to_string(),
            cost: Some(10.0),
        }
    }

    #[test]
    fn test_uid_generation() {
        let uid1 = ScanStore::generate_uid(b"{\"pages\": []}");
        let uid2 = ScanStore::generate_uid(b"{\"pages\": []}");
        let uid3 = ScanStore::generate_uid(b"{\"entities\": []}");

        assert_eq!(uid1, uid2);
        assert_ne!(uid1, uid3);
        assert_eq!(uid1.len(), 64);
    }

    #[test]
    fn test_catalog_roundtrip() {
        let store = ScanStore::new(":memory:").unwrap();
        store
            .import_products(&[
                product("3001234567890", "PAROL 500MG"),
                product("3009876543210", "MAJEZIK"),
            ])
            .unwrap();
        let catalog = store.load_catalog().unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains(&Barcode::parse("3009876543210").unwrap()));

        // a new import replaces the snapshot
        store
            .import_products(&[product("3001234567890", "PAROL 500MG")])
            .unwrap();
        assert_eq!(store.load_catalog().unwrap().len(), 1);
    }

    #[test]
    fn test_rescan_upserts() {
        let store = ScanStore::new(":memory:").unwrap();
        let mut scan = StoredScan {
            uid: ScanStore::generate_uid(b"payload"),
            source_file: "a.json".into(),
            report_type: "unknown".into(),
            strategy: None,
            item_count: 0,
            items_json: "[]".into(),
        };
        store.upsert_scan(&scan).unwrap();
        scan.strategy = Some("grid_table".into());
        scan.item_count = 3;
        store.upsert_scan(&scan).unwrap();

        let (_, scans, empty) = store.get_counts().unwrap();
        assert_eq!((scans, empty), (1, 0));
        let stored = store.get_scan_by_uid(&scan.uid).unwrap().unwrap();
        assert_eq!(stored.strategy.as_deref(), Some("grid_table"));
        assert_eq!(stored.item_count, 3);
    }
}
