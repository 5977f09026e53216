//! Clients for the three upstream intelligence feeds.
//!
//! Each client follows the same discipline: cache-check, rate-limit where
//! the upstream demands it (NVD only), bounded-timeout request, cache-store
//! on success. Failures of any kind - network, non-2xx, malformed body -
//! are logged and absorbed into `None`/empty values so callers always get a
//! usable, possibly degraded, result.

mod epss;
mod kev;
mod nvd;

pub use epss::{EpssClient, EPSS_API_URL};
pub use kev::{KevClient, KEV_CATALOG_URL};
pub use nvd::{NvdClient, NVD_API_URL};
