use serde::{Deserialize, Serialize};

/// Position of a switch. Selects which pair of ports is through-connected.
///
/// Plain track records a stand too, it just has no effect on routing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SwitchStand {
    #[default]
    Straight1,
    Straight2,
    Bend1,
    Bend2,
}

impl SwitchStand {
    pub const ALL: [SwitchStand; 4] = [
        SwitchStand::Straight1,
        SwitchStand::Straight2,
        SwitchStand::Bend1,
        SwitchStand::Bend2,
    ];

    pub fn is_straight(self) -> bool {
        matches!(self, SwitchStand::Straight1 | SwitchStand::Straight2)
    }

    pub fn is_bend(self) -> bool {
        matches!(self, SwitchStand::Bend1 | SwitchStand::Bend2)
    }
}
