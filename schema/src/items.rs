use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
pub enum Item {
    Potion,
    NetBall,
    GreatNet,
    UltraNet,
}

/// HP restored by a single potion.
pub const POTION_HEAL: u16 = 20;

impl Item {
    /// Capture strength for nets, `None` for everything else.
    pub fn capture_strength(self) -> Option<f64> {
        match self {
            Item::NetBall => Some(1.0),
            Item::GreatNet => Some(1.5),
            Item::UltraNet => Some(2.0),
            Item::Potion => None,
        }
    }

    pub fn is_net(self) -> bool {
        self.capture_strength().is_some()
    }
}
