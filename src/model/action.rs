use super::*;

// サーバーに送信するコマンド
// 送信形式への変換は convert::command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Helo { name: String },
    Join { room: u32, game_type: u32 },
    EnterPrivateRoom { room: u32 },
    NextReady,
    Bye,
    Pass, // 鳴き・ロンのスキップ
    Discard(TileId),
    Pon(TileId, TileId), // 手牌から出す2枚
    Minkan,
    Chii(TileId, TileId),
    Ankan(TileId),
    Kakan(TileId),
    Ron,
    Tsumo,
    Ryuukyoku, // 九種九牌
    Nuku,      // 北抜き
    Reach(TileId),
    Heartbeat,
    Auth(String),
    GoOk,
    Raw(String), // コンソールからの直接入力
}
