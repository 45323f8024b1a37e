use crate::core::models::PricePoint;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Which cached price list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceSlot {
    Current,
    Tomorrow,
}

impl PriceSlot {
    pub fn label(&self) -> &'static str {
        match self {
            PriceSlot::Current => "current",
            PriceSlot::Tomorrow => "tomorrow",
        }
    }
}

#[derive(Default)]
struct StoreInner {
    current: Arc<Vec<PricePoint>>,
    tomorrow: Arc<Vec<PricePoint>>,
}

/// Price caches written by the price poller and read by the query surface.
///
/// Each slot is replaced whole; readers receive a shared immutable list.
#[derive(Clone, Default)]
pub struct PriceStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl PriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, slot: PriceSlot) -> Arc<Vec<PricePoint>> {
        let inner = self.inner.read().await;
        match slot {
            PriceSlot::Current => Arc::clone(&inner.current),
            PriceSlot::Tomorrow => Arc::clone(&inner.tomorrow),
        }
    }

    pub async fn replace(&self, slot: PriceSlot, prices: Vec<PricePoint>) {
        let prices = Arc::new(prices);
        let mut inner = self.inner.write().await;
        match slot {
            PriceSlot::Current => inner.current = prices,
            PriceSlot::Tomorrow => inner.tomorrow = prices,
        }
    }
}
