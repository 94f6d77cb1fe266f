// 天鳳の鳴きのエンコード(16bit)を展開
// 下位2bitは取得元の相対座席, 以降のビットは鳴きの種類ごとにレイアウトが異なる
use crate::error::{Error, Res};
use crate::model::*;

pub const MASK_KUI: u16 = 0x0003;
pub const FLAG_CHII: u16 = 0x0004; // bit 2
pub const FLAG_PON: u16 = 0x0008; // bit 3
pub const FLAG_KAKAN: u16 = 0x0010; // bit 4
pub const FLAG_NUKI: u16 = 0x0020; // bit 5

pub const MASK_CHII_BASE: u16 = 0xFC00; // bit 10~15
pub const MASK_PON_BASE: u16 = 0xFE00; // bit 9~15
pub const MASK_KAN_TILE: u16 = 0xFF00; // bit 8~15
pub const MASK_PON_UNUSED: u16 = 0x0060; // bit 5~6

pub fn parse_meld_code(s: &str) -> Res<u16> {
    s.trim()
        .parse()
        .map_err(|_| Error::InvalidNumber(format!("meld code: {}", s)))
}

pub fn decode_meld(m: u16) -> Res<Meld> {
    let kui = (m & MASK_KUI) as u8;

    let (meld_type, from, ids) = if m & FLAG_CHII != 0 {
        (MeldType::Chii, kui, decode_chii(m))
    } else if m & FLAG_PON != 0 {
        (MeldType::Pon, kui, decode_pon(m).0)
    } else if m & FLAG_KAKAN != 0 {
        let (mut ids, added) = decode_pon(m);
        ids.push(added);
        (MeldType::Kakan, kui, ids)
    } else if m & FLAG_NUKI != 0 {
        (MeldType::Nuki, KUI_NONE, vec![((m & MASK_KAN_TILE) >> 8) as TileId])
    } else {
        let ids = decode_kan(m, kui);
        let tp = if kui != KUI_NONE {
            MeldType::Minkan
        } else {
            MeldType::Ankan
        };
        (tp, kui, ids)
    };

    let tiles = ids
        .into_iter()
        .map(Tile::new)
        .collect::<Res<Vec<Tile>>>()?;
    if !is_consistent(meld_type, &tiles) {
        return Err(Error::InvalidMeld(m));
    }

    Ok(Meld {
        meld_type,
        tiles,
        from,
    })
}

// 鳴いた牌を先頭に移動
#[inline]
fn move_to_front(v: &mut [TileId], i: usize) {
    v[..=i].rotate_right(1);
}

fn decode_chii(m: u16) -> Vec<TileId> {
    let mut t = (m & MASK_CHII_BASE) >> 10;
    let called = (t % 3) as usize;
    t /= 3;
    // 順子の開始位置(0~20) -> 牌の種別 -> 物理インデックス
    let base = (t / 7 * 9 + t % 7) * 4;
    let mut v: Vec<TileId> = (0..3)
        .map(|i| (base + 4 * i + ((m >> (3 + 2 * i)) & 3)) as TileId)
        .collect();
    move_to_front(&mut v, called);
    v
}

// ポン・加槓共通 (ポンの3枚, 加槓で追加された牌)
fn decode_pon(m: u16) -> (Vec<TileId>, TileId) {
    let unused = (m & MASK_PON_UNUSED) >> 5;
    let mut t = (m & MASK_PON_BASE) >> 9;
    let called = (t % 3) as usize;
    t /= 3;
    let base = t * 4;
    let mut v: Vec<TileId> = (0..TILE as u16)
        .filter(|&i| i != unused)
        .map(|i| (base + i) as TileId)
        .collect();
    move_to_front(&mut v, called);
    (v, (base + unused) as TileId)
}

// 明槓・暗槓 暗槓の場合は同種の4枚目を先頭とする
fn decode_kan(m: u16, kui: u8) -> Vec<TileId> {
    let mut hai = (m & MASK_KAN_TILE) >> 8;
    if kui == KUI_NONE {
        hai = (hai & !3) + 3;
    }
    let base = hai / 4 * 4;
    let mut v = vec![hai as TileId];
    v.extend((base..base + TILE as u16).filter(|&i| i != hai).map(|i| i as TileId));
    v
}

fn is_consistent(meld_type: MeldType, tiles: &[Tile]) -> bool {
    let g0 = match tiles.first() {
        Some(t) => t.general_id(),
        None => return false,
    };
    match meld_type {
        MeldType::Chii => {
            let mut gs: Vec<u8> = tiles.iter().map(|t| t.general_id()).collect();
            gs.sort();
            tiles.len() == 3 && gs[0] % 10 <= 7 && gs[0] < 30 && gs[1] == gs[0] + 1 && gs[2] == gs[0] + 2
        }
        MeldType::Nuki => tiles.len() == 1,
        _ => tiles.iter().all(|t| t.general_id() == g0),
    }
}

#[cfg(test)]
fn ids(meld: &Meld) -> Vec<TileId> {
    meld.tiles.iter().map(|t| t.id).collect()
}

#[cfg(test)]
fn layout_ids(meld: &Meld) -> Vec<TileId> {
    meld.layout().iter().map(|t| t.id).collect()
}

#[test]
fn test_decode_chii() {
    // 上家の4pをチーして 3p4p0p
    let m = decode_meld(28807).unwrap();
    assert_eq!(m.meld_type, MeldType::Chii);
    assert_eq!(m.from, KUI_LEFT);
    assert_eq!(ids(&m), vec![48, 44, 53]);
    assert_eq!(m.claimed().unwrap().general_name(), "4p");
    assert_eq!(layout_ids(&m), vec![48, 44, 53]);
}

#[test]
fn test_decode_pon() {
    // 下家からポン 5s (赤5は使わない)
    let m = decode_meld(34825).unwrap();
    assert_eq!(m.meld_type, MeldType::Pon);
    assert_eq!(m.from, KUI_RIGHT);
    assert_eq!(ids(&m), vec![91, 89, 90]);
    // 下家から鳴いた牌は右端
    assert_eq!(layout_ids(&m), vec![89, 90, 91]);

    // 上家からポン 赤5を含む
    let m = decode_meld(33899).unwrap();
    assert_eq!(m.from, KUI_LEFT);
    assert_eq!(ids(&m), vec![88, 89, 90]);
    assert_eq!(layout_ids(&m), vec![88, 89, 90]);

    let m = decode_meld(51755).unwrap();
    assert_eq!(ids(&m), vec![135, 132, 134]);
    assert!(m.tiles.iter().all(|t| t.general_name() == "7z"));
}

#[test]
fn test_decode_kakan() {
    let m = decode_meld(34833).unwrap();
    assert_eq!(m.meld_type, MeldType::Kakan);
    assert_eq!(m.from, KUI_RIGHT);
    assert_eq!(ids(&m), vec![91, 89, 90, 88]);
    assert_eq!(layout_ids(&m), vec![88, 91, 89, 90]);
}

#[test]
fn test_decode_kan() {
    // 対面から明槓 4m
    let m = decode_meld(3586).unwrap();
    assert_eq!(m.meld_type, MeldType::Minkan);
    assert_eq!(m.from, KUI_ACROSS);
    assert_eq!(ids(&m), vec![14, 12, 13, 15]);
    assert_eq!(layout_ids(&m), vec![12, 14, 13, 15]);

    let m = decode_meld(3585).unwrap();
    assert_eq!(m.from, KUI_RIGHT);
    assert_eq!(layout_ids(&m), vec![15, 12, 13, 14]);

    // 暗槓 東
    let m = decode_meld(27648).unwrap();
    assert_eq!(m.meld_type, MeldType::Ankan);
    assert_eq!(m.from, KUI_NONE);
    assert_eq!(m.claimed(), None);
    assert_eq!(ids(&m), vec![111, 108, 109, 110]);
}

#[test]
fn test_decode_nuki() {
    let m = decode_meld(30752).unwrap();
    assert_eq!(m.meld_type, MeldType::Nuki);
    assert_eq!(ids(&m), vec![120]);
    assert_eq!(m.claimed(), None);
}

#[test]
fn test_decode_out_of_range() {
    // 牌番号が136以上になる暗槓
    assert!(matches!(decode_meld(0xFF00), Err(Error::TileOutOfRange(_))));
    assert!(parse_meld_code("70000").is_err());
    assert_eq!(parse_meld_code("28807").unwrap(), 28807);
}

#[test]
fn test_decode_inconsistent() {
    // 字牌の順子 (108, 112, 116)
    assert!(matches!(decode_meld(64516), Err(Error::InvalidMeld(64516))));
}
