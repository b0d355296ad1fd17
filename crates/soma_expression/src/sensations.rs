//! Per-need bodily sensation lines.
//!
//! Every need has three bands on its high side (>90, >60, >40). Energy is the
//! exception: it is felt on the low side (<10, <30).

use soma_core::{ModuleSet, Need, NeedsVector};

/// Lower bounds (exclusive) of the high-side bands, most severe first.
pub const HIGH_BANDS: [u8; 3] = [90, 60, 40];
/// Upper bounds (exclusive) of the energy bands, most severe first.
pub const ENERGY_BANDS: [u8; 2] = [10, 30];

const ENERGY: [&str; 2] = [
    "Your eyelids are heavy as lead; you could fall asleep standing up.",
    "You feel drained and sluggish.",
];

/// High-side lines per need, most severe first.
static HIGH_LINES: [(Need, [&str; 3]); 8] = [
    (
        Need::Hunger,
        [
            "Your stomach is cramping with hunger; it's hard to think of anything but food.",
            "Your stomach growls loudly.",
            "You could go for a snack.",
        ],
    ),
    (
        Need::Thirst,
        [
            "Your throat is parched and your lips are cracked.",
            "Your mouth is dry; you really want a drink.",
            "You feel a little thirsty.",
        ],
    ),
    (
        Need::Hygiene,
        [
            "You feel filthy; your skin itches and you can smell yourself.",
            "You feel sticky and unwashed.",
            "A shower would feel nice.",
        ],
    ),
    (
        Need::Bladder,
        [
            "Your bladder is about to burst; you are squirming in place.",
            "You really need to pee.",
            "You feel some pressure in your bladder.",
        ],
    ),
    (
        Need::Bowel,
        [
            "Your gut is cramping urgently; you need a toilet right now.",
            "Your belly feels heavy and uncomfortable.",
            "You feel a vague rumble in your bowels.",
        ],
    ),
    (
        Need::Stress,
        [
            "Your chest is tight and your thoughts are racing; you are close to breaking.",
            "Your shoulders are tense and your patience is thin.",
            "You feel a little on edge.",
        ],
    ),
    (
        Need::Arousal,
        [
            "Heat floods your body; it is almost impossible to focus.",
            "You feel warm and restless.",
            "A faint tingle of excitement lingers.",
        ],
    ),
    (
        Need::Libido,
        [
            "Desire gnaws at you constantly.",
            "Your thoughts keep drifting toward intimacy.",
            "You feel a quiet longing for closeness.",
        ],
    ),
];

fn high_lines(need: Need) -> Option<&'static [&'static str; 3]> {
    HIGH_LINES
        .iter()
        .find(|(n, _)| *n == need)
        .map(|(_, lines)| lines)
}

/// The sentence for one need at one level, if any band applies.
pub fn sensation(need: Need, level: u8) -> Option<&'static str> {
    if need == Need::Energy {
        return ENERGY_BANDS
            .iter()
            .position(|bound| level < *bound)
            .map(|i| ENERGY[i]);
    }
    let lines = high_lines(need)?;
    HIGH_BANDS
        .iter()
        .position(|bound| level > *bound)
        .map(|i| lines[i])
}

/// Sensation lines for every enabled need, in declaration order.
pub fn bodily_sensations(needs: &NeedsVector, modules: &ModuleSet) -> Vec<&'static str> {
    Need::ALL
        .into_iter()
        .filter(|need| need.is_enabled(modules))
        .filter_map(|need| sensation(need, needs.level(need)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_edges() {
        let hunger = high_lines(Need::Hunger).unwrap();
        assert_eq!(sensation(Need::Hunger, 40), None);
        assert_eq!(sensation(Need::Hunger, 41), Some(hunger[2]));
        assert_eq!(sensation(Need::Hunger, 61), Some(hunger[1]));
        assert_eq!(sensation(Need::Hunger, 90), Some(hunger[1]));
        assert_eq!(sensation(Need::Hunger, 91), Some(hunger[0]));
    }

    #[test]
    fn test_energy_low_side() {
        assert_eq!(sensation(Need::Energy, 100), None);
        assert_eq!(sensation(Need::Energy, 30), None);
        assert_eq!(sensation(Need::Energy, 29), Some(ENERGY[1]));
        assert_eq!(sensation(Need::Energy, 9), Some(ENERGY[0]));
    }

    #[test]
    fn test_every_line_is_written() {
        for need in Need::ALL.into_iter().filter(|n| *n != Need::Energy) {
            let lines = high_lines(need).unwrap();
            assert!(lines.iter().all(|l| !l.is_empty()), "{} has an empty line", need);
        }
        assert!(high_lines(Need::Energy).is_none());
    }

    #[test]
    fn test_eros_lines_follow_module() {
        let mut needs = NeedsVector::uniform(20.0);
        needs.energy = 80.0;
        needs.arousal = 95.0;
        assert!(bodily_sensations(&needs, &ModuleSet::default()).is_empty());

        let eros = ModuleSet {
            eros: true,
            ..Default::default()
        };
        assert_eq!(
            bodily_sensations(&needs, &eros),
            vec![high_lines(Need::Arousal).unwrap()[0]]
        );
    }
}
