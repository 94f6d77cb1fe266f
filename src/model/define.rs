// 型エイリアス
pub type Seat = usize; // 座席 (絶対座席 0~3)
pub type TileId = u8; // 牌の物理インデックス (0~135)
pub type Score = i32; // 得点

// Number
pub const SEAT: usize = 4; // 座席の数
pub const TILE_COUNT: usize = 136; // 牌の総数
pub const TILE: usize = 4; // 同種の牌の数
pub const INITIAL_WALL: usize = 70; // 配牌後の牌山の残り枚数
pub const REACH_SENTINEL: u32 = 255; // REINITの捨て牌リスト中のリーチ宣言マーカー
pub const YAKUMAN_DELTA: Score = 32000; // 役満とみなす点数移動

// 天鳳では自分の座席は常に0 (サーバー側で座席が回転済み)
pub const SELF_SEAT: Seat = 0;

// 相対座席 (鳴きの取得元)
pub const KUI_NONE: u8 = 0; // 自分
pub const KUI_RIGHT: u8 = 1; // 下家
pub const KUI_ACROSS: u8 = 2; // 対面
pub const KUI_LEFT: u8 = 3; // 上家
