use super::*;

// Actor・Listenerへの通知
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Notification {
    Login {
        succeeded: bool,
        code: Option<String>, // ERRのエラーコード
    },
    GameStart {
        resumed: bool,
        log_id: Option<String>, // 牌譜ID (TAIKYOKUのみ)
        table_wind: usize,      // 牌譜URLのtw
    },
    Init {
        resync: bool, // REINIT
        direction: Direction,
        seq: u32,
        honba: u32,
    },
    Draw {
        tile: Tile,
        actions: Option<u32>, // ツモ和了・リーチなどの選択肢がある場合にセット
    },
    Discard {
        seat: Seat,
        tile: Tile,
        tsumogiri: bool,
        callable: bool, // 鳴き・ロンの選択待ち
    },
    Meld {
        seat: Seat,
        meld: Meld,
    },
    Reach {
        seat: Seat,
    },
    Dora {
        tile: Tile,
    },
    Agari {
        who: Seat,
        from_who: Seat,
        point: Score,
        deltas: [Score; SEAT],
        scores: [Score; SEAT],
        yakuman: bool,
    },
    Ryuukyoku {
        deltas: [Score; SEAT],
        scores: [Score; SEAT],
        yakuman: bool,
    },
    GameEnd,
    UnknownEvent {
        message: String,
    },
    ConnectionLost,
    Close,
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Notification::*;
        match self {
            Draw { tile, .. } => write!(f, "Draw {}", tile),
            Discard {
                seat,
                tile,
                tsumogiri,
                ..
            } => write!(f, "Discard {} {}{}", seat, tile, if *tsumogiri { "" } else { " (hand)" }),
            Meld { seat, meld } => write!(f, "Meld {} {}", seat, meld),
            Dora { tile } => write!(f, "Dora {}", tile),
            UnknownEvent { message } => write!(f, "UnknownEvent {}", message),
            n => write!(f, "{:?}", n),
        }
    }
}
