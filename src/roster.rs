use crate::constants::MAX_NAME_CHARS;
use crate::types::{DinosaurKind, PlayerView};

const DINOSAURS: [DinosaurKind; 5] = [
    DinosaurKind::TRex,
    DinosaurKind::Triceratops,
    DinosaurKind::Stegosaurus,
    DinosaurKind::Velociraptor,
    DinosaurKind::Brontosaurus,
];

const HUES_DEG: [u16; 5] = [0, 60, 120, 180, 240];

impl DinosaurKind {
    pub fn for_lane(lane: usize) -> Self {
        DINOSAURS[lane % DINOSAURS.len()]
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Self::TRex => "🦖",
            Self::Triceratops => "🦕",
            Self::Stegosaurus => "🦴",
            Self::Velociraptor => "🐉",
            Self::Brontosaurus => "🐲",
        }
    }
}

pub fn player_id(lane: usize) -> String {
    format!("dino_{}", lane + 1)
}

pub fn default_name(lane: usize) -> String {
    format!("Dino {}", lane + 1)
}

/// One avatar per lane, in lane order.
pub fn build_roster(player_count: usize) -> Vec<PlayerView> {
    (0..player_count)
        .map(|lane| {
            let dinosaur = DinosaurKind::for_lane(lane);
            PlayerView {
                id: player_id(lane),
                name: default_name(lane),
                lane,
                dinosaur,
                emoji: dinosaur.emoji(),
                hue_deg: HUES_DEG[lane % HUES_DEG.len()],
            }
        })
        .collect()
}

/// Keeps names from the previous roster for lanes that still exist.
pub fn resize_roster(previous: &[PlayerView], player_count: usize) -> Vec<PlayerView> {
    let mut roster = build_roster(player_count);
    for (player, old) in roster.iter_mut().zip(previous) {
        player.name = old.name.clone();
    }
    roster
}

pub fn sanitize_name(value: &str, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return fallback.to_string();
    }
    trimmed.chars().take(MAX_NAME_CHARS).collect()
}
