//! Presentation Sink
//!
//! The core pushes plain value updates outward; how they are drawn is the
//! host's business. [`present`] maps a tick's events onto a [`HudSink`].

use tracing::info;
use crate::game::events::{SimEvent, SimEventData};

/// Receiver of HUD value updates.
pub trait HudSink {
    /// Live score changed.
    fn set_score(&mut self, meters: f32);

    /// Displayed best changed.
    fn set_best(&mut self, meters: f32);

    /// Show or hide the game-over panel.
    fn show_game_over(&mut self, show: bool, final_score: f32, final_best: f32);

    /// Pause label state.
    fn set_paused(&mut self, paused: bool);
}

/// Forward presentation events to a sink, in order.
pub fn present<H>(events: &[SimEvent], sink: &mut H)
where
    H: HudSink + ?Sized,
{
    for event in events {
        match event.data {
            SimEventData::ScoreChanged { score } => sink.set_score(score),
            SimEventData::BestChanged { best } => sink.set_best(best),
            SimEventData::PauseChanged { paused } => sink.set_paused(paused),
            SimEventData::GameOver { final_score, final_best } => {
                sink.show_game_over(true, final_score, final_best)
            }
            SimEventData::RunReset => sink.show_game_over(false, 0.0, 0.0),
            _ => {}
        }
    }
}

/// Last values pushed to the HUD.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HudState {
    /// Live score
    pub score: f32,
    /// Displayed best
    pub best: f32,
    /// Pause label shown
    pub paused: bool,
    /// Final score and best while the game-over panel is shown
    pub game_over: Option<(f32, f32)>,
}

impl HudSink for HudState {
    fn set_score(&mut self, meters: f32) {
        self.score = meters;
    }

    fn set_best(&mut self, meters: f32) {
        self.best = meters;
    }

    fn show_game_over(&mut self, show: bool, final_score: f32, final_best: f32) {
        self.game_over = show.then_some((final_score, final_best));
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }
}

/// HUD that logs updates. Score updates are only logged per whole meter.
#[derive(Clone, Debug, Default)]
pub struct TracingHud {
    last_meter: Option<u32>,
}

impl HudSink for TracingHud {
    fn set_score(&mut self, meters: f32) {
        let meter = meters.max(0.0) as u32;
        if self.last_meter != Some(meter) {
            self.last_meter = Some(meter);
            info!("{} m", meter);
        }
    }

    fn set_best(&mut self, meters: f32) {
        info!("BEST: {:.0} m", meters);
    }

    fn show_game_over(&mut self, show: bool, final_score: f32, final_best: f32) {
        if show {
            info!("GAME OVER  SCORE: {:.0} m  BEST: {:.0} m", final_score, final_best);
        } else {
            self.last_meter = None;
        }
    }

    fn set_paused(&mut self, paused: bool) {
        info!("{}", if paused { "PAUSED" } else { "RESUMED" });
    }
}
