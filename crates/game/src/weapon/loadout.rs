use super::archetype::WeaponKind;
use super::state::Weapon;

/// One instance of every archetype plus the equipped index.
#[derive(Debug, Clone)]
pub struct Loadout {
    weapons: Vec<Weapon>,
    current: usize,
}

impl Default for Loadout {
    fn default() -> Self {
        Self::new()
    }
}

impl Loadout {
    pub fn new() -> Self {
        Self {
            weapons: WeaponKind::ALL.into_iter().map(Weapon::new).collect(),
            current: 0,
        }
    }

    pub fn current(&self) -> &Weapon {
        &self.weapons[self.current]
    }

    pub fn current_mut(&mut self) -> &mut Weapon {
        &mut self.weapons[self.current]
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Weapon> {
        self.weapons.iter()
    }

    /// Out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.weapons.len() {
            self.current = index;
            true
        } else {
            false
        }
    }

    pub fn next(&mut self) {
        self.current = (self.current + 1) % self.weapons.len();
    }

    pub fn previous(&mut self) {
        self.current = (self.current + self.weapons.len() - 1) % self.weapons.len();
    }

    /// Advances reload and recoil timers on every weapon, equipped or not.
    pub fn update(&mut self, now_ms: u64) {
        for weapon in &mut self.weapons {
            weapon.update(now_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycling_wraps() {
        let mut loadout = Loadout::new();
        assert_eq!(loadout.current().kind(), WeaponKind::Rifle);

        loadout.previous();
        assert_eq!(loadout.current().kind(), WeaponKind::Smg);
        loadout.next();
        loadout.next();
        assert_eq!(loadout.current().kind(), WeaponKind::Sniper);

        assert!(!loadout.select(3));
        assert_eq!(loadout.current_index(), 1);
    }

    #[test]
    fn switching_keeps_reload_progress() {
        let mut loadout = Loadout::new();
        loadout.current_mut().fire(0);
        loadout.current_mut().reload(0);

        loadout.select(2);
        loadout.update(1_000);
        loadout.select(0);
        assert!(loadout.current().is_reloading());

        loadout.update(2_001);
        assert!(!loadout.current().is_reloading());
        assert_eq!(loadout.current().current_ammo(), 30);
    }
}
