//! Canvas service
//!
//! Composes the geometry, palette oracle, pixel store, placement log and
//! settlement sink into the operations exposed to clients:
//! 1. Reads: bounds check, then `PixelStore::get`
//! 2. Direct writes: validate, then `PixelStore::set`
//! 3. Settled writes: validate, encode, then `SettlementSink::submit`
//!
//! Every rejection happens before anything is mutated or submitted. Store
//! and settlement calls are bounded by timeouts; a timeout means the
//! outcome is unknown and is never retried here.

use std::future::Future;
use std::time::Duration;

use placeboard_config::{BackendConfig, CanvasConfig};
use placeboard_ipc::{ExtraPixelsPlaced, PlacePixelRequest};
use tracing::{debug, info, warn};

use crate::attribution::{AttributionLog, owner_label};
use crate::batch::{BatchPlacement, encode_single};
use crate::bitfield::{BitfieldCanvas, PixelStore};
use crate::error::CanvasError;
use crate::events::{PlacementEvent, PlacementEvents};
use crate::geometry::CanvasGeometry;
use crate::palette::PaletteOracle;
use crate::settlement::{Entrypoint, SettlementCall, SettlementSink};
use crate::validation::{ColorBound, PlacementValidator};

/// Default time allowed for a store read or write
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(1);

/// Default outer bound on a settlement submission
pub const DEFAULT_SETTLEMENT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug)]
pub struct CanvasService<S, P, A, T> {
    validator: PlacementValidator,
    store: S,
    palette: P,
    attribution: A,
    settlement: T,
    store_timeout: Duration,
    settlement_timeout: Duration,
    events: PlacementEvents,
}

impl<S, P, A, T> CanvasService<S, P, A, T>
where
    S: PixelStore,
    P: PaletteOracle,
    A: AttributionLog,
    T: SettlementSink,
{
    /// Build a service validating against the store's own geometry
    pub fn new(store: S, palette: P, attribution: A, settlement: T) -> Self {
        Self {
            validator: PlacementValidator::new(*store.geometry()),
            store,
            palette,
            attribution,
            settlement,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            settlement_timeout: DEFAULT_SETTLEMENT_TIMEOUT,
            events: PlacementEvents::new(),
        }
    }

    /// Build a service whose colour bound and timeouts come from config.
    ///
    /// The store must have been built for the configured geometry.
    pub fn from_config(
        canvas: &CanvasConfig,
        backend: &BackendConfig,
        store: S,
        palette: P,
        attribution: A,
        settlement: T,
    ) -> Result<Self, CanvasError> {
        let geometry = CanvasGeometry::from_config(canvas)?;
        if *store.geometry() != geometry {
            return Err(CanvasError::InvalidInput(format!(
                "store geometry {:?} does not match configured {:?}",
                store.geometry(),
                geometry
            )));
        }
        Ok(Self::new(store, palette, attribution, settlement).with_backend_config(backend))
    }

    /// Apply the colour bound and timeouts from a backend config
    pub fn with_backend_config(mut self, backend: &BackendConfig) -> Self {
        self.validator = self
            .validator
            .with_bound(ColorBound::from(backend.color_bound))
            .with_palette_timeout(backend.timeouts.palette());
        self.store_timeout = backend.timeouts.store();
        self.settlement_timeout = backend.timeouts.settlement();
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    #[inline]
    pub fn geometry(&self) -> &CanvasGeometry {
        self.validator.geometry()
    }

    pub fn validator(&self) -> &PlacementValidator {
        &self.validator
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn palette(&self) -> &P {
        &self.palette
    }

    pub fn attribution(&self) -> &A {
        &self.attribution
    }

    pub fn settlement(&self) -> &T {
        &self.settlement
    }

    pub fn events(&self) -> &PlacementEvents {
        &self.events
    }

    /// Current colour index of the pixel at `position`
    pub async fn get_pixel(&self, position: u64) -> Result<u32, CanvasError> {
        self.validator.check_position(position)?;
        bounded(self.store_timeout, "store get", self.store.get(position)).await
    }

    /// Label of the pixel's most recent placer.
    ///
    /// Unplaced pixels and failed lookups both answer with the zero address.
    pub async fn pixel_info(&self, position: u64) -> Result<String, CanvasError> {
        self.validator.check_position(position)?;

        let lookup = bounded(
            self.store_timeout,
            "attribution lookup",
            self.attribution.latest_placer(position),
        )
        .await;

        match lookup {
            Ok(info) => Ok(owner_label(info.as_ref())),
            Err(err) => {
                warn!("Attribution lookup for pixel {} failed: {}", position, err);
                Ok(owner_label(None))
            }
        }
    }

    /// Validate and write one pixel to the store
    pub async fn place_pixel(&self, request: PlacePixelRequest) -> Result<(), CanvasError> {
        let PlacePixelRequest {
            position,
            color,
            timestamp,
        } = request;

        self.validator.validate(&self.palette, position, color).await?;
        bounded(self.store_timeout, "store set", self.store.set(position, color)).await?;

        debug!("Placed pixel {} = {}", position, color);
        self.events.emit(PlacementEvent::PixelPlaced {
            position,
            color,
            timestamp,
        });
        Ok(())
    }

    /// Validate one pixel and submit it to settlement
    pub async fn place_pixel_settled(&self, request: PlacePixelRequest) -> Result<(), CanvasError> {
        let PlacePixelRequest {
            position,
            color,
            timestamp,
        } = request;

        self.validator.validate(&self.palette, position, color).await?;

        let call = SettlementCall::new(Entrypoint::PlacePixel, encode_single(position, color, timestamp));
        self.settle(&call).await?;

        self.events.emit(PlacementEvent::PixelSettled {
            position,
            color,
            timestamp,
        });
        Ok(())
    }

    /// Validate every pixel of a batch in order, then submit it to settlement.
    ///
    /// Nothing is submitted unless every item passes. Items are not applied
    /// as one transaction downstream.
    pub async fn place_extra_pixels(
        &self,
        batch: BatchPlacement,
    ) -> Result<ExtraPixelsPlaced, CanvasError> {
        if batch.is_empty() {
            return Err(CanvasError::InvalidInput("No pixels provided".to_string()));
        }

        self.validator.validate_all(&self.palette, &batch.items).await?;

        let call = SettlementCall::new(Entrypoint::PlaceExtraPixels, batch.encode()?);
        self.settle(&call).await?;

        info!(
            "Settled {} extra pixels at timestamp {}",
            batch.len(),
            batch.timestamp
        );

        let summary = batch.summary();
        self.events.emit(PlacementEvent::ExtraPixelsSettled {
            placements: batch.items,
            timestamp: batch.timestamp,
        });
        Ok(summary)
    }

    async fn settle(&self, call: &SettlementCall) -> Result<(), CanvasError> {
        let result = bounded(self.settlement_timeout, "settlement", self.settlement.submit(call)).await;
        if let Err(err) = &result {
            warn!("Settlement of {} failed: {}", call.entrypoint, err);
        }
        result
    }
}

impl<P, A, T> CanvasService<BitfieldCanvas, P, A, T> {
    /// Packed byte image of the whole canvas
    pub fn snapshot(&self) -> Vec<u8> {
        self.store.snapshot()
    }
}

/// Run `fut` with a deadline; elapsing leaves the outcome unknown
async fn bounded<F, R>(
    timeout: Duration,
    operation: &'static str,
    fut: F,
) -> Result<R, CanvasError>
where
    F: Future<Output = Result<R, CanvasError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!("{} timed out after {:?}", operation, timeout);
            Err(CanvasError::Timeout { operation })
        }
    }
}
