use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeldType {
    Chii,   // チー
    Pon,    // ポン
    Minkan, // 明槓
    Ankan,  // 暗槓
    Kakan,  // 加槓
    Nuki,   // 北抜き (三麻)
}

impl MeldType {
    // 嶺上牌をツモるので牌山が減る
    #[inline]
    pub fn consumes_wall(&self) -> bool {
        matches!(self, MeldType::Ankan | MeldType::Kakan)
    }
}

// 鳴き(副露)の1グループ
// tiles[0]は他家から取得した牌 (取得元がある場合)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Meld {
    pub meld_type: MeldType,
    pub tiles: Vec<Tile>,
    pub from: u8, // 相対座席 0: なし, 1: 下家, 2: 対面, 3: 上家
}

impl Meld {
    // 他家から取得した牌
    pub fn claimed(&self) -> Option<Tile> {
        if self.from == KUI_NONE {
            None
        } else {
            self.tiles.first().copied()
        }
    }

    // 加槓の対象となるポンかどうか
    pub fn is_pon_of(&self, general_id: u8) -> bool {
        self.meld_type == MeldType::Pon && self.tiles.iter().all(|t| t.general_id() == general_id)
    }

    // 卓上の並び順 (サーバー側の表示と同じ配置)
    pub fn layout(&self) -> Vec<Tile> {
        let mut v = self.tiles.clone();
        match self.meld_type {
            MeldType::Pon => {
                if self.from < KUI_LEFT {
                    v.rotate_right(1);
                }
                if self.from < KUI_ACROSS {
                    v.rotate_right(1);
                }
            }
            MeldType::Minkan => match self.from {
                KUI_RIGHT => v.swap(0, 3),
                KUI_ACROSS => v.swap(0, 1),
                _ => {}
            },
            MeldType::Kakan => v.rotate_right(1),
            _ => {}
        }
        v
    }
}

impl fmt::Display for Meld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s: Vec<String> = self.tiles.iter().map(|t| t.to_string()).collect();
        write!(f, "{:?}({})<{}", self.meld_type, s.join("|"), self.from)
    }
}
