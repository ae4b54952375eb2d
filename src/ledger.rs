// src/ledger.rs
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::errors::LedgerError;
use crate::types::{HistoricalStats, HistoryRecord, PriceObservation};

const HEADER_FIELDS: [&str; 5] = ["timestamp", "site", "price", "is_new_low", "below_threshold"];
const REQUIRED_FIELDS: [&str; 3] = ["timestamp", "site", "price"];
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only CSV store of price observations.
///
/// Reads degrade to the no-data sentinel instead of failing; writes repair a
/// headerless file before appending so a damaged store never blocks future
/// sessions.
pub struct HistoryLedger {
    path: PathBuf,
}

impl HistoryLedger {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    /// Derived statistics over every record in the store.
    ///
    /// Never fails: a missing, empty, or malformed file reads as no history.
    pub fn stats(&self) -> HistoricalStats {
        let len = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(_) => {
                info!("no price history file yet, treating as first run");
                return HistoricalStats::no_data();
            }
        };
        if len == 0 {
            info!("price history file is empty, treating as first run");
            return HistoricalStats::no_data();
        }

        let mut reader = match csv::ReaderBuilder::new().flexible(true).from_path(&self.path) {
            Ok(reader) => reader,
            Err(e) => {
                error!(error = %e, "could not open price history, treating as no data");
                return HistoricalStats::no_data();
            }
        };

        let headers = match reader.headers() {
            Ok(headers) => headers.clone(),
            Err(e) => {
                error!(error = %e, "price history header unreadable, treating as no data");
                return HistoricalStats::no_data();
            }
        };

        let missing: Vec<&str> = REQUIRED_FIELDS
            .iter()
            .filter(|field| !headers.iter().any(|h| h == **field))
            .copied()
            .collect();
        if !missing.is_empty() {
            error!(?missing, "price history is missing required columns, treating as no data");
            return HistoricalStats::no_data();
        }

        // Unwrap is safe, presence checked just above
        let price_idx = headers.iter().position(|h| h == "price").unwrap();

        let mut total_records = 0usize;
        let mut lowest_ever: Option<f64> = None;

        for row in reader.records() {
            let record = match row {
                Ok(record) => record,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable history row");
                    continue;
                }
            };
            total_records += 1;

            match record.get(price_idx).map(str::parse::<f64>) {
                Some(Ok(price)) => {
                    lowest_ever = Some(lowest_ever.map_or(price, |low: f64| low.min(price)));
                }
                _ => {
                    warn!(value = ?record.get(price_idx), "invalid price value in history row");
                }
            }
        }

        HistoricalStats { lowest_ever, total_records }
    }

    /// Append one record per observation.
    ///
    /// `is_new_low` is computed against the stats as they stood before this
    /// batch; every observation in the batch shares that baseline.
    pub fn append(
        &self,
        observations: &[PriceObservation],
        threshold: f64,
    ) -> Result<usize, LedgerError> {
        if observations.is_empty() {
            return Ok(0);
        }

        let baseline = self.stats();
        let needs_header = self.ensure_writable_header()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| LedgerError::Io(e.to_string()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer
                .write_record(HEADER_FIELDS)
                .map_err(|e| LedgerError::Io(e.to_string()))?;
            info!("created new price history file with headers");
        }

        for obs in observations {
            let record = HistoryRecord {
                timestamp: obs.observed_at.format(TIMESTAMP_FORMAT).to_string(),
                site: obs.site.clone(),
                price: obs.price,
                is_new_low: baseline.lowest_ever.map_or(true, |low| obs.price < low),
                below_threshold: obs.price <= threshold,
            };
            writer
                .serialize(&record)
                .map_err(|e| LedgerError::Io(e.to_string()))?;
        }

        writer.flush().map_err(|e| LedgerError::Io(e.to_string()))?;
        info!("saved {} price records to history", observations.len());
        Ok(observations.len())
    }

    /// Returns whether the caller still has to write the header row.
    ///
    /// A file that exists but does not start with a recognizable header is
    /// rewritten fresh; leaving it would wedge every future append.
    fn ensure_writable_header(&self) -> Result<bool, LedgerError> {
        let len = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(_) => return Ok(true),
        };
        if len == 0 {
            return Ok(true);
        }

        let file = fs::File::open(&self.path).map_err(|e| LedgerError::Io(e.to_string()))?;
        let mut first_line = String::new();
        BufReader::new(file)
            .read_line(&mut first_line)
            .map_err(|e| LedgerError::Io(e.to_string()))?;

        if first_line.contains("timestamp") {
            return Ok(false);
        }

        warn!("price history lacks a recognizable header, rewriting it");
        fs::write(&self.path, format!("{}\n", HEADER_FIELDS.join(",")))
            .map_err(|e| LedgerError::Io(e.to_string()))?;
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn temp_ledger(tag: &str) -> (HistoryLedger, PathBuf) {
        let path = std::env::temp_dir().join(format!(
            "pricewatch_{}_{}.csv",
            tag,
            std::process::id()
        ));
        let _ = fs::remove_file(&path);
        (HistoryLedger::new(&path), path)
    }

    fn obs(site: &str, price: f64) -> PriceObservation {
        PriceObservation {
            site: site.to_string(),
            url: format!("https://{}.example/", site.to_lowercase()),
            price,
            suspect: false,
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn test_stats_on_missing_file() {
        let (ledger, _path) = temp_ledger("missing");
        assert_eq!(ledger.stats(), HistoricalStats::no_data());
    }

    #[test]
    fn test_stats_on_empty_file() {
        let (ledger, path) = temp_ledger("empty");
        fs::write(&path, "").unwrap();
        assert_eq!(ledger.stats(), HistoricalStats::no_data());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_stats_on_missing_price_column() {
        let (ledger, path) = temp_ledger("nocolumn");
        fs::write(&path, "timestamp,site\n2024-01-01 10:00:00,Amazon India\n").unwrap();
        assert_eq!(ledger.stats(), HistoricalStats::no_data());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_stats_is_idempotent() {
        let (ledger, path) = temp_ledger("idempotent");
        ledger.append(&[obs("Amazon", 8999.0), obs("Flipkart", 8499.0)], 7500.0).unwrap();
        assert_eq!(ledger.stats(), ledger.stats());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_durability_across_batches() {
        let (ledger, path) = temp_ledger("durability");

        ledger.append(&[obs("Amazon", 8999.0), obs("Flipkart", 8499.0)], 7500.0).unwrap();
        ledger.append(&[obs("Myntra", 9200.0)], 7500.0).unwrap();
        ledger.append(&[obs("Amazon", 7999.0), obs("Flipkart", 8799.0)], 7500.0).unwrap();

        let stats = ledger.stats();
        assert_eq!(stats.total_records, 5);
        assert_eq!(stats.lowest_ever, Some(7999.0));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_new_low_uses_pre_session_baseline() {
        let (ledger, path) = temp_ledger("baseline");
        ledger.append(&[obs("Amazon", 9000.0)], 7500.0).unwrap();

        // 8500 is a new low vs 9000; 8200 is too, even though 8500 in the
        // same batch already undercut it, because the baseline is fixed
        ledger.append(&[obs("Amazon", 8500.0), obs("Flipkart", 8200.0)], 8400.0).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let rows: Vec<&str> = content.lines().skip(1).collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[1].ends_with("true,false"), "8500: new low, above threshold");
        assert!(rows[2].ends_with("true,true"), "8200: new low, below threshold");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_first_batch_counts_as_new_low() {
        let (ledger, path) = temp_ledger("firstlow");
        ledger.append(&[obs("Amazon", 9000.0)], 7500.0).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.lines().nth(1).unwrap().contains("true,false"));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_header_repair_on_corrupt_file() {
        let (ledger, path) = temp_ledger("repair");
        fs::write(&path, "not a header at all\n9000,???\n").unwrap();

        ledger.append(&[obs("Amazon", 8999.0)], 7500.0).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next().unwrap(), HEADER_FIELDS.join(","));
        assert!(lines.next().unwrap().contains("Amazon"));

        let stats = ledger.stats();
        assert_eq!(stats.total_records, 1);
        assert_eq!(stats.lowest_ever, Some(8999.0));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_bad_price_cells_are_skipped_not_fatal() {
        let (ledger, path) = temp_ledger("badcell");
        fs::write(
            &path,
            "timestamp,site,price,is_new_low,below_threshold\n\
             2024-01-01 10:00:00,Amazon,8999,false,false\n\
             2024-01-01 10:00:05,Flipkart,oops,false,false\n",
        )
        .unwrap();

        let stats = ledger.stats();
        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.lowest_ever, Some(8999.0));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_records_keep_arrival_order() {
        let (ledger, path) = temp_ledger("order");
        ledger.append(&[obs("B", 9100.0), obs("A", 9000.0)], 7500.0).unwrap();
        ledger.append(&[obs("C", 8900.0)], 7500.0).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let sites: Vec<&str> = content
            .lines()
            .skip(1)
            .map(|l| l.split(',').nth(1).unwrap())
            .collect();
        assert_eq!(sites, vec!["B", "A", "C"]);
        let _ = fs::remove_file(&path);
    }
}
