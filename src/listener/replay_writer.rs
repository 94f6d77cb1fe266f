use tracing::{info, warn};

use super::Listener;
use crate::model::*;
use crate::util::misc::append_line;

pub const REPLAY_URL: &str = "http://tenhou.net/0/";

// [ReplayWriter]
// 牌譜URLと役満のタグを1行ずつ追記 (読み返すことはない)
#[derive(Debug)]
pub struct ReplayWriter {
    path: String,
}

impl ReplayWriter {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
        }
    }

    fn write(&self, line: &str) {
        if let Err(e) = append_line(&self.path, line) {
            warn!("failed to write replay: {}", e);
        }
    }
}

pub fn replay_url(log_id: &str, table_wind: usize) -> String {
    format!("{}?log={}&tw={}", REPLAY_URL, log_id, table_wind)
}

impl Listener for ReplayWriter {
    fn notify_event(&mut self, _game: &GameData, event: &Notification) {
        use Notification::*;
        match event {
            GameStart {
                log_id: Some(id),
                table_wind,
                ..
            } => {
                let url = replay_url(id, *table_wind);
                info!(url = url.as_str(), "replay");
                self.write(&url);
            }
            Agari { yakuman: true, .. } | Ryuukyoku { yakuman: true, .. } => {
                self.write("tag: Yakuman");
            }
            _ => {}
        }
    }
}

#[test]
fn test_replay_writer() {
    let dir = std::env::temp_dir().join(format!("tenhou_client_replay_{}", std::process::id()));
    std::fs::remove_dir_all(&dir).ok();
    let path = dir.join("replay.txt");
    let mut w = ReplayWriter::new(path.to_str().unwrap());
    let game = GameData::new();

    w.notify_event(
        &game,
        &Notification::GameStart {
            resumed: false,
            log_id: Some("2024010100gm-0001-0000-abcdef01".to_string()),
            table_wind: 3,
        },
    );
    w.notify_event(&game, &Notification::GameStart { resumed: true, log_id: None, table_wind: 0 });
    w.notify_event(
        &game,
        &Notification::Ryuukyoku {
            deltas: [0; SEAT],
            scores: [25000; SEAT],
            yakuman: false,
        },
    );
    w.notify_event(
        &game,
        &Notification::Agari {
            who: 1,
            from_who: 1,
            point: 32000,
            deltas: [-8000, 32000, -16000, -8000],
            scores: [17000, 57000, 9000, 17000],
            yakuman: true,
        },
    );

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        text,
        "http://tenhou.net/0/?log=2024010100gm-0001-0000-abcdef01&tw=3\ntag: Yakuman\n"
    );
    std::fs::remove_dir_all(&dir).ok();
}
