#[derive(Debug, Clone)]
pub struct PlayerConfig {
    pub radius: f32,
    pub max_health: f32,
    pub move_speed: f32,

    pub respawn_delay_ms: u64,

    pub spawn_margin: f32,
    pub min_spawn_distance: f32,
    pub spawn_attempts: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            radius: 16.0,
            max_health: 100.0,
            move_speed: 200.0,

            respawn_delay_ms: 3000,

            spawn_margin: 100.0,
            min_spawn_distance: 150.0,
            spawn_attempts: 50,
        }
    }
}
