//! Events emitted after successful placements.
//!
//! Listeners let outer layers (websocket fan-out, indexers) react to
//! placements without the service knowing about them.

use std::sync::{PoisonError, RwLock};

use crate::batch::PixelPlacement;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementEvent {
    /// A pixel was written to the store.
    PixelPlaced {
        position: u64,
        color: u32,
        timestamp: u64,
    },
    /// A single pixel was confirmed by settlement.
    PixelSettled {
        position: u64,
        color: u32,
        timestamp: u64,
    },
    /// A batch was confirmed by settlement.
    ExtraPixelsSettled {
        placements: Vec<PixelPlacement>,
        timestamp: u64,
    },
}

type Listener = Box<dyn Fn(PlacementEvent) + Send + Sync>;

/// Registered listeners, each receiving a clone of every event.
#[derive(Default)]
pub struct PlacementEvents {
    listeners: RwLock<Vec<Listener>>,
}

impl std::fmt::Debug for PlacementEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlacementEvents")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

impl PlacementEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener<F>(&self, listener: F)
    where
        F: Fn(PlacementEvent) + Send + Sync + 'static,
    {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(listener));
    }

    pub fn emit(&self, event: PlacementEvent) {
        let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
        for listener in listeners.iter() {
            listener(event.clone());
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}
