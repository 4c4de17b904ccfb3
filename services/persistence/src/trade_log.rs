//! JSON-lines trade log
//!
//! Appends one JSON object per trade, in publication order, to a log
//! file. The writer is a subscriber on the `trades` topic rather than
//! an engine hook, so logging failures can never touch book state.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use market_data::bus::Subscription;
use market_data::events::MarketEvent;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, warn};
use types::trade::Trade;

/// Trade log failures.
#[derive(Error, Debug)]
pub enum TradeLogError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Append-only JSON-lines trade log.
#[derive(Debug)]
pub struct TradeLog {
    writer: BufWriter<File>,
    path: PathBuf,
    lines_written: u64,
}

impl TradeLog {
    /// Open (or create) the log for appending.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, TradeLogError> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            path,
            lines_written: 0,
        })
    }

    /// Append one trade as a single JSON line and flush.
    pub fn append(&mut self, trade: &Trade) -> Result<(), TradeLogError> {
        let line = serde_json::to_string(trade)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.lines_written += 1;
        Ok(())
    }

    /// Lines appended through this handle.
    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read every parseable trade from a log file, skipping corrupt lines
/// with a warning.
pub fn read_trades(path: impl AsRef<Path>) -> Result<Vec<Trade>, TradeLogError> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);
    let mut trades = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Trade>(&line) {
            Ok(trade) => trades.push(trade),
            Err(err) => {
                warn!(line = line_no + 1, %err, "skipping corrupt trade log line");
            }
        }
    }
    Ok(trades)
}

/// Spawn a writer task that appends every trade arriving on the
/// subscription. Runs until the returned handle is aborted.
///
/// The subscription should be on a `trades` topic; other event kinds
/// are ignored. Lag is logged — dropped trade events are lost to the
/// log, never re-requested.
pub fn spawn_writer(mut subscription: Subscription, path: impl Into<PathBuf>) -> JoinHandle<()> {
    let path = path.into();
    tokio::spawn(async move {
        let mut log = match TradeLog::open(&path) {
            Ok(log) => log,
            Err(err) => {
                error!(path = %path.display(), %err, "cannot open trade log");
                return;
            }
        };
        loop {
            match subscription.recv().await {
                MarketEvent::Trade(trade) => {
                    if let Err(err) = log.append(&trade) {
                        error!(path = %path.display(), %err, "trade log append failed");
                    }
                }
                MarketEvent::Lagged { missed } => {
                    warn!(missed, "trade log subscriber lagged; trades lost from log");
                }
                _ => {}
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use types::ids::{OrderId, Symbol};
    use types::numeric::{Price, Quantity};
    use types::order::Side;

    fn make_trade(trade_id: u64) -> Trade {
        Trade::new(
            trade_id,
            Symbol::new("BTC-USDT"),
            Price::from_u64(100),
            Quantity::from_str("1").unwrap(),
            OrderId::new(),
            OrderId::new(),
            Side::Sell,
            Decimal::from_str_exact("0.01").unwrap(),
            Decimal::from_str_exact("0.02").unwrap(),
            1708123456789000000,
        )
    }

    #[test]
    fn test_append_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.jsonl");

        let mut log = TradeLog::open(&path).unwrap();
        log.append(&make_trade(1)).unwrap();
        log.append(&make_trade(2)).unwrap();
        assert_eq!(log.lines_written(), 2);

        let trades = read_trades(&path).unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].trade_id, 1);
        assert_eq!(trades[1].trade_id, 2);
    }

    #[test]
    fn test_append_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.jsonl");

        TradeLog::open(&path).unwrap().append(&make_trade(1)).unwrap();
        TradeLog::open(&path).unwrap().append(&make_trade(2)).unwrap();

        let trades = read_trades(&path).unwrap();
        assert_eq!(trades.len(), 2);
    }

    #[test]
    fn test_corrupt_lines_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.jsonl");

        let mut log = TradeLog::open(&path).unwrap();
        log.append(&make_trade(1)).unwrap();
        std::fs::write(
            &path,
            format!(
                "{}\nnot json at all\n",
                std::fs::read_to_string(&path).unwrap().trim_end()
            ),
        )
        .unwrap();

        let trades = read_trades(&path).unwrap();
        assert_eq!(trades.len(), 1);
    }
}
