use super::archetype::{WeaponKind, WeaponSpec};

const RECOIL_FACTOR: f32 = 1.2;

/// Runtime state of one owned weapon. All timing is driven by the caller's
/// clock so tests can step time explicitly.
#[derive(Debug, Clone)]
pub struct Weapon {
    kind: WeaponKind,
    current_ammo: u32,
    reloading: bool,
    last_shot_ms: Option<u64>,
    reload_started_ms: u64,
    length: f32,
}

impl Weapon {
    pub fn new(kind: WeaponKind) -> Self {
        let spec = kind.spec();
        Self {
            kind,
            current_ammo: spec.magazine_size,
            reloading: false,
            last_shot_ms: None,
            reload_started_ms: 0,
            length: spec.length,
        }
    }

    pub fn kind(&self) -> WeaponKind {
        self.kind
    }

    pub fn spec(&self) -> &'static WeaponSpec {
        self.kind.spec()
    }

    pub fn name(&self) -> &'static str {
        self.spec().name
    }

    pub fn damage(&self) -> f32 {
        self.spec().damage
    }

    pub fn current_ammo(&self) -> u32 {
        self.current_ammo
    }

    pub fn magazine_size(&self) -> u32 {
        self.spec().magazine_size
    }

    pub fn is_reloading(&self) -> bool {
        self.reloading
    }

    /// Visual barrel length, shortened by recoil after a shot.
    pub fn length(&self) -> f32 {
        self.length
    }

    /// Returns whether a shot was produced. An empty magazine starts a reload
    /// and refuses the shot.
    pub fn fire(&mut self, now_ms: u64) -> bool {
        if self.reloading {
            return false;
        }

        if self.current_ammo == 0 {
            self.reload(now_ms);
            return false;
        }

        if let Some(last) = self.last_shot_ms {
            let since = now_ms.saturating_sub(last) as f32;
            if since < self.spec().shot_interval_ms() {
                return false;
            }
        }

        self.current_ammo -= 1;
        self.last_shot_ms = Some(now_ms);
        self.length = self.spec().length / RECOIL_FACTOR;
        true
    }

    /// Starts a timed reload. No-op while reloading or with a full magazine.
    pub fn reload(&mut self, now_ms: u64) -> bool {
        if self.reloading || self.current_ammo >= self.magazine_size() {
            return false;
        }
        self.reloading = true;
        self.reload_started_ms = now_ms;
        true
    }

    pub fn update(&mut self, now_ms: u64) {
        if self.reloading && now_ms.saturating_sub(self.reload_started_ms) > self.spec().reload_ms()
        {
            self.current_ammo = self.magazine_size();
            self.reloading = false;
        }

        let max = self.spec().length;
        self.length += (max - self.length) / 3.0;
    }

    /// Seconds left on the current reload, zero when not reloading.
    pub fn reload_remaining(&self, now_ms: u64) -> f32 {
        if !self.reloading {
            return 0.0;
        }
        let elapsed = now_ms.saturating_sub(self.reload_started_ms) as f32 / 1000.0;
        (self.spec().reload_time - elapsed).max(0.0)
    }
}
