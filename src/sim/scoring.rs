//! Score ledger and economy
//!
//! The ledger is owned by the session and only changes through named events
//! ([`ScoreLedger::record`]) and purchases ([`ScoreLedger::spend`]). Kill-type
//! events build a combo that multiplies their points; the combo drops to zero
//! when more than the combo window passes without another kill.

use serde::{Deserialize, Serialize};

use crate::consts::{COMBO_WINDOW, LARGE_ASTEROID_SIZE, MIN_ASTEROID_SIZE, STARTING_SCORE};

/// Everything that can move the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreEvent {
    RegularKill,
    ResourceCarrierKill,
    ShooterKill,
    EliteNavigatorKill,
    BossHit,
    BossDefeated,
    EliteStructureDestroyed,
    MultiKill,
    WaveComplete,
    PerfectWave,
    AsteroidLaunch,
    ResourceLost,
    AsteroidSplit,
}

impl ScoreEvent {
    /// Base points before the combo multiplier
    pub fn base_points(self) -> u64 {
        match self {
            ScoreEvent::RegularKill => 100,
            ScoreEvent::ResourceCarrierKill => 250,
            ScoreEvent::ShooterKill => 150,
            ScoreEvent::EliteNavigatorKill => 200,
            ScoreEvent::BossHit => 50,
            ScoreEvent::BossDefeated => 1000,
            ScoreEvent::EliteStructureDestroyed => 750,
            ScoreEvent::MultiKill => 300,
            ScoreEvent::WaveComplete => 500,
            ScoreEvent::PerfectWave => 1000,
            ScoreEvent::AsteroidLaunch => 0,
            ScoreEvent::ResourceLost => 0,
            ScoreEvent::AsteroidSplit => 0,
        }
    }

    /// Kill-type events extend the combo
    pub fn is_combo_eligible(self) -> bool {
        matches!(
            self,
            ScoreEvent::RegularKill
                | ScoreEvent::ResourceCarrierKill
                | ScoreEvent::ShooterKill
                | ScoreEvent::EliteNavigatorKill
                | ScoreEvent::BossDefeated
                | ScoreEvent::EliteStructureDestroyed
        )
    }
}

/// Points multiplier for a combo count: 1.0 for the first kill, +20% per step after
pub fn combo_multiplier(combo: u32) -> f64 {
    let m = 1.0 + 0.2 * combo.saturating_sub(1) as f64;
    if m.is_finite() { m } else { f64::MAX }
}

/// Cost of launching an asteroid of `size` on `wave`.
///
/// Grows with both size and wave. Unusable sizes are priced as the smallest rock.
pub fn asteroid_cost(size: f32, wave: u32) -> u64 {
    let size = if size.is_finite() {
        size.clamp(MIN_ASTEROID_SIZE, LARGE_ASTEROID_SIZE * 1.5)
    } else {
        MIN_ASTEROID_SIZE
    } as f64;
    let wave_factor = 1.0 + 0.1 * wave.saturating_sub(1) as f64;
    ((10.0 + size * 0.5) * wave_factor).round() as u64
}

/// Snapshot of the ledger for HUDs and tests
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub score: u64,
    pub combo: u32,
    pub combo_timer: f32,
    pub multiplier: f64,
}

/// The game's score, combo and combo countdown
#[derive(Debug, Clone)]
pub struct ScoreLedger {
    score: u64,
    combo: u32,
    combo_timer: f32,
    combo_window: f32,
}

impl Default for ScoreLedger {
    fn default() -> Self {
        Self::new(COMBO_WINDOW)
    }
}

impl ScoreLedger {
    pub fn new(combo_window: f32) -> Self {
        let combo_window = if combo_window.is_finite() && combo_window > 0.0 {
            combo_window
        } else {
            COMBO_WINDOW
        };
        Self {
            score: STARTING_SCORE,
            combo: 0,
            combo_timer: 0.0,
            combo_window,
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    /// Multiplier the next combo-eligible event would receive
    pub fn multiplier(&self) -> f64 {
        combo_multiplier(self.combo.saturating_add(1))
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            score: self.score,
            combo: self.combo,
            combo_timer: self.combo_timer,
            multiplier: self.multiplier(),
        }
    }

    /// Back to the starting balance (new game)
    pub fn reset(&mut self) {
        self.score = STARTING_SCORE;
        self.combo = 0;
        self.combo_timer = 0.0;
    }

    /// Overwrite the score from a save (combo always starts empty)
    pub fn restore(&mut self, score: u64) {
        self.score = score;
        self.combo = 0;
        self.combo_timer = 0.0;
    }

    /// Count down the combo window; the combo resets once it is exceeded
    pub fn advance(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 || self.combo == 0 {
            return;
        }
        self.combo_timer -= dt;
        if self.combo_timer < 0.0 {
            self.combo = 0;
            self.combo_timer = 0.0;
        }
    }

    /// Apply a named event; returns the points awarded
    pub fn record(&mut self, event: ScoreEvent) -> u64 {
        let base = event.base_points();
        let points = if event.is_combo_eligible() {
            self.combo = self.combo.saturating_add(1);
            self.combo_timer = self.combo_window;
            let scaled = base as f64 * combo_multiplier(self.combo);
            if scaled.is_finite() && scaled < u64::MAX as f64 {
                scaled.round() as u64
            } else {
                u64::MAX
            }
        } else {
            base
        };
        self.score = self.score.saturating_add(points);
        points
    }

    /// Deduct `amount` if affordable. Rejects NaN, infinite and negative amounts.
    pub fn spend(&mut self, amount: f64) -> bool {
        if !amount.is_finite() || amount < 0.0 {
            log::debug!("Rejected spend of {amount}");
            return false;
        }
        let cost = amount.ceil();
        if cost > self.score as f64 {
            log::debug!("Rejected spend of {amount}: score is {}", self.score);
            return false;
        }
        self.score -= (cost as u64).min(self.score);
        true
    }
}
