#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeaponKind {
    Rifle,
    Sniper,
    Smg,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 3] = [WeaponKind::Rifle, WeaponKind::Sniper, WeaponKind::Smg];

    pub fn spec(self) -> &'static WeaponSpec {
        match self {
            WeaponKind::Rifle => &WeaponSpec::RIFLE,
            WeaponKind::Sniper => &WeaponSpec::SNIPER,
            WeaponKind::Smg => &WeaponSpec::SMG,
        }
    }
}

/// Immutable weapon archetype. The three kinds differ only in these numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct WeaponSpec {
    pub name: &'static str,
    pub damage: f32,
    /// Rounds per second.
    pub fire_rate: f32,
    pub magazine_size: u32,
    /// Seconds.
    pub reload_time: f32,
    pub projectile_speed: f32,
    /// Degrees.
    pub spread: f32,
    pub length: f32,
    pub thickness: f32,
}

impl WeaponSpec {
    pub const RIFLE: WeaponSpec = WeaponSpec {
        name: "Assault Rifle",
        damage: 6.0,
        fire_rate: 8.0,
        magazine_size: 30,
        reload_time: 2.0,
        projectile_speed: 300.0,
        spread: 3.0,
        length: 1.5,
        thickness: 0.4,
    };

    pub const SNIPER: WeaponSpec = WeaponSpec {
        name: "Sniper Rifle",
        damage: 20.0,
        fire_rate: 1.0,
        magazine_size: 5,
        reload_time: 3.0,
        projectile_speed: 900.0,
        spread: 0.5,
        length: 2.2,
        thickness: 0.3,
    };

    pub const SMG: WeaponSpec = WeaponSpec {
        name: "Submachine Gun",
        damage: 2.5,
        fire_rate: 10.0,
        magazine_size: 45,
        reload_time: 1.5,
        projectile_speed: 400.0,
        spread: 6.0,
        length: 1.2,
        thickness: 0.5,
    };

    /// Minimum milliseconds between two successful shots.
    pub fn shot_interval_ms(&self) -> f32 {
        1000.0 / self.fire_rate
    }

    pub fn reload_ms(&self) -> u64 {
        (self.reload_time * 1000.0) as u64
    }
}
