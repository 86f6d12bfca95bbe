use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};

/// Visual resource shared by every remote avatar. The renderer reads it; the
/// core only manages its lifetime.
#[derive(Debug)]
pub struct AvatarAsset {
    generation: u64,
    diameter: f32,
}

impl AvatarAsset {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn diameter(&self) -> f32 {
        self.diameter
    }
}

impl Drop for AvatarAsset {
    fn drop(&mut self) {
        log::debug!("Released avatar asset (generation {})", self.generation);
    }
}

/// Hands out one shared [`AvatarAsset`] while at least one holder is alive.
/// Once the last handle drops the asset is freed and the next acquire builds
/// a fresh one.
#[derive(Debug, Default)]
pub struct AvatarCache {
    slot: Mutex<Weak<AvatarAsset>>,
    generations: AtomicU64,
}

impl AvatarCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> &'static AvatarCache {
        static CACHE: OnceLock<AvatarCache> = OnceLock::new();
        CACHE.get_or_init(AvatarCache::new)
    }

    pub fn acquire(&self, diameter: f32) -> Arc<AvatarAsset> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(asset) = slot.upgrade() {
            return asset;
        }

        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let asset = Arc::new(AvatarAsset {
            generation,
            diameter,
        });
        *slot = Arc::downgrade(&asset);
        log::debug!("Loaded avatar asset (generation {})", generation);
        asset
    }

    pub fn is_loaded(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .strong_count()
            > 0
    }
}
