/// Fjall-based metadata ledger for rain, wind and danger records
///
/// The ledger is the source of truth for which slices exist. Each record
/// points at exactly one artifact in the artifact store, keyed by record id.
///
/// Stored in dedicated partitions:
///
/// - Rain records (radar sweeps and versioned precipitation forecasts)
/// - Wind records (strength contours and direction images, versioned)
/// - Danger records (one per timestamp/rain/wind triple)
/// - Secondary indexes for time, kind and version lookups
/// - Metadata (last retention pass)
///
/// ## Usage
///
/// ```rust,ignore
/// use weatherfusion::ledger::{FjallLedger, NewRain};
///
/// let ledger = FjallLedger::open("data/ledger")?;
/// let record = ledger.insert_rain(NewRain::radar(ts))?;
/// let latest = ledger.latest_radar()?;
/// ```

pub mod error;
pub mod partitions;
pub mod records;
pub mod store;

pub use error::{LedgerError, Result};
pub use records::{
    DangerInsert, DangerRecord, NewDanger, NewRain, NewWind, RainKind, RainRecord, WindKind,
    WindRecord,
};
pub use store::{FjallLedger, LedgerStats};
