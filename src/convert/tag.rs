// 受信したタグ名の分類
// ツモ(T123)と打牌(D123, e45 など)はタグ名に座席と牌番号を含む
use crate::model::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    Helo,
    Err,
    Rejoin,
    Go,
    Taikyoku,
    Saikai,
    Init,
    Reinit,
    Dora,
    Meld,
    Reach,
    Agari,
    Ryuukyoku,
    Draw { tile: u32 },                                // 自分のツモ
    OtherDraw { seat: Seat },                          // 他家のツモ (牌は不明)
    Discard { seat: Seat, tile: u32, tsumogiri: bool }, // 小文字はツモ切り
    Ignored,                                           // ロビー関連など処理不要なタグ
    Unknown,
}

// 受信しても何もしないタグ
const IGNORED: [&str; 10] = [
    "UN", "LN", "PROF", "BYE", "SHUFFLE", "CHAT", "FURITEN", "RANKING", "KANSEN", "GOK",
];

pub fn classify(name: &str) -> Tag {
    use Tag::*;
    match name {
        "HELO" => return Helo,
        "ERR" => return Err,
        "REJOIN" => return Rejoin,
        "GO" => return Go,
        "TAIKYOKU" => return Taikyoku,
        "SAIKAI" => return Saikai,
        "INIT" => return Init,
        "REINIT" => return Reinit,
        "DORA" => return Dora,
        "N" => return Meld,
        "REACH" => return Reach,
        "AGARI" => return Agari,
        "RYUUKYOKU" => return Ryuukyoku,
        "U" => return OtherDraw { seat: 1 },
        "V" => return OtherDraw { seat: 2 },
        "W" => return OtherDraw { seat: 3 },
        _ => {}
    }

    if let Some((c, tile)) = split_letter_number(name) {
        match c {
            'T' => return Draw { tile },
            'D' | 'E' | 'F' | 'G' | 'd' | 'e' | 'f' | 'g' => {
                let seat = (c.to_ascii_lowercase() as u8 - b'd') as Seat;
                return Discard {
                    seat,
                    tile,
                    tsumogiri: c.is_ascii_lowercase(),
                };
            }
            _ => {}
        }
    }

    if IGNORED.contains(&name) {
        Ignored
    } else {
        Unknown
    }
}

// "D123" -> ('D', 123)
fn split_letter_number(name: &str) -> Option<(char, u32)> {
    let mut chars = name.chars();
    let c = chars.next()?;
    let rest = chars.as_str();
    if !c.is_ascii_alphabetic() || rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok().map(|n| (c, n))
}

#[test]
fn test_classify_fixed() {
    assert_eq!(classify("HELO"), Tag::Helo);
    assert_eq!(classify("N"), Tag::Meld);
    assert_eq!(classify("TAIKYOKU"), Tag::Taikyoku);
    assert_eq!(classify("V"), Tag::OtherDraw { seat: 2 });
    assert_eq!(classify("LN"), Tag::Ignored);
    assert_eq!(classify("XYZ"), Tag::Unknown);
}

#[test]
fn test_classify_parametrized() {
    assert_eq!(classify("T12"), Tag::Draw { tile: 12 });
    assert_eq!(
        classify("D0"),
        Tag::Discard {
            seat: 0,
            tile: 0,
            tsumogiri: false
        }
    );
    assert_eq!(
        classify("g135"),
        Tag::Discard {
            seat: 3,
            tile: 135,
            tsumogiri: true
        }
    );
    assert_eq!(
        classify("E7"),
        Tag::Discard {
            seat: 1,
            tile: 7,
            tsumogiri: false
        }
    );
    // 数字が続かない場合や他の文字は対象外
    assert_eq!(classify("T"), Tag::Unknown);
    assert_eq!(classify("D1a"), Tag::Unknown);
    assert_eq!(classify("H12"), Tag::Unknown);
    assert_eq!(classify("t12"), Tag::Unknown);
}
