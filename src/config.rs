use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Res};

pub const DEFAULT_HOST: &str = "133.242.10.78";
pub const DEFAULT_PORT: u16 = 10080;

// 設定ファイル (JSON) 省略した項目はデフォルト値
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tenhou_id: String,           // HELOのname (ID or "NoName")
    pub host: String,
    pub port: u16,
    pub room: u32,                   // 0: 一般卓
    pub game_type: u32,              // JOINのt属性の2番目
    pub private_room: Option<u32>,   // 個室番号 (CHAT /lobby)
    pub replay_file: Option<String>, // 牌譜URLの追記先
    pub actor: String,
    pub heartbeat_ms: u64,
    pub login_timeout_ms: u64,
    pub match_timeout_ms: u64,
    pub frame_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tenhou_id: "NoName".to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            room: 0,
            game_type: 1,
            private_room: None,
            replay_file: None,
            actor: "Nop".to_string(),
            heartbeat_ms: 5000,
            login_timeout_ms: 5000,
            match_timeout_ms: 60000,
            frame_timeout_ms: 20000,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Res<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path, e)))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Res<Self> {
        let conf: Self = serde_json::from_str(text)?;
        conf.validate()?;
        Ok(conf)
    }

    pub fn validate(&self) -> Res {
        if self.tenhou_id.is_empty() {
            return Err(Error::Config("tenhou_id is empty".to_string()));
        }
        if self.heartbeat_ms == 0 {
            return Err(Error::Config("heartbeat_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[inline]
    pub fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms)
    }

    #[inline]
    pub fn login_timeout(&self) -> Duration {
        Duration::from_millis(self.login_timeout_ms)
    }

    #[inline]
    pub fn match_timeout(&self) -> Duration {
        Duration::from_millis(self.match_timeout_ms)
    }

    #[inline]
    pub fn frame_timeout(&self) -> Duration {
        Duration::from_millis(self.frame_timeout_ms)
    }
}

#[test]
fn test_config_defaults() {
    let conf = Config::from_json("{}").unwrap();
    assert_eq!(conf, Config::default());
    assert_eq!(conf.addr(), "133.242.10.78:10080");
    assert_eq!(conf.login_timeout(), Duration::from_secs(5));
    assert_eq!(conf.match_timeout(), Duration::from_secs(60));
}

#[test]
fn test_config_partial() {
    let conf = Config::from_json(
        r#"{"tenhou_id": "ID0123-abcdefgh", "private_room": 1234, "replay_file": "log/replay.txt"}"#,
    )
    .unwrap();
    assert_eq!(conf.tenhou_id, "ID0123-abcdefgh");
    assert_eq!(conf.private_room, Some(1234));
    assert_eq!(conf.game_type, 1);
    assert_eq!(conf.heartbeat_ms, 5000);

    assert!(matches!(Config::from_json(r#"{"tenhou_id": ""}"#), Err(Error::Config(_))));
    assert!(matches!(Config::from_json("[1]"), Err(Error::Json(_))));
    assert!(matches!(Config::load("/nonexistent/tenhou.json"), Err(Error::Config(_))));
}
