//! Who placed a pixel most recently.

use std::collections::HashMap;
use std::future::Future;
use std::sync::RwLock;

use placeboard_ipc::PixelInfo;

use crate::constants::ZERO_ADDRESS;
use crate::error::CanvasError;

/// Read side of the placement history.
pub trait AttributionLog: Send + Sync {
    /// Most recent placer of `position`, None if nobody has placed there
    fn latest_placer(
        &self,
        position: u64,
    ) -> impl Future<Output = Result<Option<PixelInfo>, CanvasError>> + Send;
}

/// Label shown for a pixel's owner: the username if set, else the
/// `0x`-prefixed address, else the zero address.
pub fn owner_label(info: Option<&PixelInfo>) -> String {
    match info {
        Some(info) if !info.name.is_empty() => info.name.clone(),
        Some(info) => format!("0x{}", info.address),
        None => ZERO_ADDRESS.to_string(),
    }
}

#[derive(Debug, Clone)]
struct PlacementRecord {
    address: String,
    timestamp: u64,
}

/// In-memory placement history with registered usernames
#[derive(Debug, Default)]
pub struct PlacementLog {
    placements: RwLock<HashMap<u64, Vec<PlacementRecord>>>,
    usernames: RwLock<HashMap<String, String>>,
}

impl PlacementLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `address` placed a pixel at `position`
    pub fn record(&self, position: u64, address: &str, timestamp: u64) -> Result<(), CanvasError> {
        let mut placements = self.placements.write().map_err(|_| poisoned())?;
        placements.entry(position).or_default().push(PlacementRecord {
            address: normalize_address(address),
            timestamp,
        });
        Ok(())
    }

    /// Register or replace the display name of `address`
    pub fn set_username(&self, address: &str, name: &str) -> Result<(), CanvasError> {
        let mut usernames = self.usernames.write().map_err(|_| poisoned())?;
        usernames.insert(normalize_address(address), name.to_string());
        Ok(())
    }

    /// Number of placements recorded for `position`
    pub fn placement_count(&self, position: u64) -> Result<usize, CanvasError> {
        let placements = self.placements.read().map_err(|_| poisoned())?;
        Ok(placements.get(&position).map_or(0, Vec::len))
    }

    fn latest(&self, position: u64) -> Result<Option<PixelInfo>, CanvasError> {
        let placements = self.placements.read().map_err(|_| poisoned())?;
        // Later records win ties on timestamp
        let latest = placements.get(&position).and_then(|records| {
            records
                .iter()
                .enumerate()
                .max_by_key(|(index, record)| (record.timestamp, *index))
                .map(|(_, record)| record)
        });

        let Some(record) = latest else {
            return Ok(None);
        };

        let usernames = self.usernames.read().map_err(|_| poisoned())?;
        Ok(Some(PixelInfo {
            address: record.address.clone(),
            name: usernames.get(&record.address).cloned().unwrap_or_default(),
        }))
    }
}

impl AttributionLog for PlacementLog {
    async fn latest_placer(&self, position: u64) -> Result<Option<PixelInfo>, CanvasError> {
        self.latest(position)
    }
}

fn normalize_address(address: &str) -> String {
    address
        .strip_prefix("0x")
        .unwrap_or(address)
        .to_ascii_lowercase()
}

fn poisoned() -> CanvasError {
    CanvasError::BackendUnavailable("placement log lock poisoned".to_string())
}
