use tracing::{debug, info, warn};

use super::Listener;
use crate::model::*;

// [EventPrinter]
#[derive(Debug, Default)]
pub struct EventPrinter {
    verbose: bool, // 局の状態も毎回出力
}

impl EventPrinter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn print_score_change(&self, game: &GameData, deltas: &[Score; SEAT]) {
        for s in 0..SEAT {
            let delta = deltas[s];
            let new = game.players[s].score;
            info!("player {}: {} ({:+})", s, new, delta);
        }
    }
}

impl Listener for EventPrinter {
    fn notify_event(&mut self, game: &GameData, event: &Notification) {
        use Notification::*;
        match event {
            Init { .. } => {
                info!("{}", event);
                info!("\n{}", game);
            }
            Draw { .. } | Discard { .. } | Dora { .. } => {
                debug!("{}", event);
            }
            Meld { seat, .. } => {
                info!("{}", event);
                debug!("\n{}", game.players[*seat]);
            }
            Agari { deltas, .. } | Ryuukyoku { deltas, .. } => {
                info!("{}", event);
                self.print_score_change(game, deltas);
            }
            UnknownEvent { message } => {
                warn!("unknown event: {}", message);
            }
            _ => {
                info!("{}", event);
            }
        }

        if self.verbose {
            debug!("\n{}", game);
        }
    }
}
