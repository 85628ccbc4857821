//! Fixed roster of weekly boss templates.
//!
//! Flavor fields are frozen into the boss row at creation; editing the
//! roster never rewrites existing encounters.

/// Template a weekly encounter is rolled from.
#[derive(Debug, Clone, Copy)]
pub struct BossTemplate {
    pub boss_type: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub min_hp: i64,
    pub max_hp: i64,
    pub xp_reward: i64,
    pub bonus_shields: i64,
}

pub const ROSTER: [BossTemplate; 5] = [
    BossTemplate {
        boss_type: "procrastination_hydra",
        name: "Hydra of Procrastination",
        description: "Grows two heads for every task you put off.",
        icon: "hydra",
        min_hp: 350,
        max_hp: 500,
        xp_reward: 150,
        bonus_shields: 1,
    },
    BossTemplate {
        boss_type: "doomscroll_siren",
        name: "Doomscroll Siren",
        description: "Sings you into the infinite feed.",
        icon: "siren",
        min_hp: 300,
        max_hp: 450,
        xp_reward: 120,
        bonus_shields: 0,
    },
    BossTemplate {
        boss_type: "clutter_golem",
        name: "Clutter Golem",
        description: "Assembled from every surface you meant to clear.",
        icon: "golem",
        min_hp: 400,
        max_hp: 600,
        xp_reward: 180,
        bonus_shields: 1,
    },
    BossTemplate {
        boss_type: "burnout_wraith",
        name: "Burnout Wraith",
        description: "Feeds on skipped breaks and late nights.",
        icon: "wraith",
        min_hp: 450,
        max_hp: 650,
        xp_reward: 220,
        bonus_shields: 2,
    },
    BossTemplate {
        boss_type: "deadline_devourer",
        name: "Deadline Devourer",
        description: "Eats calendars margin-first.",
        icon: "devourer",
        min_hp: 350,
        max_hp: 550,
        xp_reward: 160,
        bonus_shields: 1,
    },
];
