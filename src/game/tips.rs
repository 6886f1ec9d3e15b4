use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use tracing::warn;

const EMBEDDED_TIPS: &str = include_str!("../../data/did-you-know.json");

/// A "did you know" fact shown while the game loads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Tip {
    pub artist: String,
    pub fact: String,
}

/// Draws tips at random without repeating one until all have been shown.
pub struct TipRotator {
    tips: Vec<Tip>,
    shown: Vec<usize>,
    current: Option<usize>,
    rng: StdRng,
}

impl TipRotator {
    pub fn new(tips: Vec<Tip>) -> Self {
        Self::with_rng(tips, StdRng::from_entropy())
    }

    pub fn with_rng(tips: Vec<Tip>, rng: StdRng) -> Self {
        Self {
            tips,
            shown: Vec::new(),
            current: None,
            rng,
        }
    }

    /// The tips bundled with the game.
    pub fn embedded() -> Self {
        let tips = serde_json::from_str(EMBEDDED_TIPS).unwrap_or_else(|e| {
            warn!("embedded tips are invalid: {}", e);
            Vec::new()
        });
        Self::new(tips)
    }

    /// Advance to a tip that has not been shown in this cycle.
    pub fn next_tip(&mut self) -> Option<&Tip> {
        if self.tips.is_empty() {
            return None;
        }
        if self.shown.len() >= self.tips.len() {
            self.shown.clear();
        }

        let remaining: Vec<usize> = (0..self.tips.len())
            .filter(|i| !self.shown.contains(i))
            .collect();
        let pick = remaining[self.rng.gen_range(0..remaining.len())];
        self.shown.push(pick);
        self.current = Some(pick);
        self.tips.get(pick)
    }

    pub fn current(&self) -> Option<&Tip> {
        self.current.and_then(|i| self.tips.get(i))
    }

    /// Indices shown in the current cycle, oldest first.
    pub fn history(&self) -> &[usize] {
        &self.shown
    }

    pub fn len(&self) -> usize {
        self.tips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tips.is_empty()
    }
}
