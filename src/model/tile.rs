use std::collections::BTreeSet;

use super::*;
use crate::error::{Error, Res};

// 牌の物理インデックス -> 表示名 ("5m*"は赤5)
#[rustfmt::skip]
const TILE_NAMES: [&str; TILE_COUNT] = [
    "1m", "1m", "1m", "1m", "2m", "2m", "2m", "2m", "3m", "3m", "3m", "3m",
    "4m", "4m", "4m", "4m", "5m*", "5m", "5m", "5m", "6m", "6m", "6m", "6m",
    "7m", "7m", "7m", "7m", "8m", "8m", "8m", "8m", "9m", "9m", "9m", "9m",
    "1p", "1p", "1p", "1p", "2p", "2p", "2p", "2p", "3p", "3p", "3p", "3p",
    "4p", "4p", "4p", "4p", "5p*", "5p", "5p", "5p", "6p", "6p", "6p", "6p",
    "7p", "7p", "7p", "7p", "8p", "8p", "8p", "8p", "9p", "9p", "9p", "9p",
    "1s", "1s", "1s", "1s", "2s", "2s", "2s", "2s", "3s", "3s", "3s", "3s",
    "4s", "4s", "4s", "4s", "5s*", "5s", "5s", "5s", "6s", "6s", "6s", "6s",
    "7s", "7s", "7s", "7s", "8s", "8s", "8s", "8s", "9s", "9s", "9s", "9s",
    "1z", "1z", "1z", "1z", "2z", "2z", "2z", "2z", "3z", "3z", "3z", "3z",
    "4z", "4z", "4z", "4z", "5z", "5z", "5z", "5z", "6z", "6z", "6z", "6z",
    "7z", "7z", "7z", "7z",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Tile {
    pub id: TileId,
    pub taken: bool, // 鳴きで他家に取られた
}

impl Tile {
    pub fn new(id: TileId) -> Res<Self> {
        if id as usize >= TILE_COUNT {
            return Err(Error::TileOutOfRange(id as u32));
        }
        Ok(Self { id, taken: false })
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        TILE_NAMES[self.id as usize]
    }

    // 赤5を区別しない表示名
    #[inline]
    pub fn general_name(&self) -> &'static str {
        &self.name()[..2]
    }

    // 赤5は"0m"のように表記
    pub fn official_name(&self) -> String {
        if self.is_red() {
            format!("0{}", self.suit())
        } else {
            self.name().to_string()
        }
    }

    // 赤5を区別しない種別ID 萬子:1~9, 筒子:11~19, 索子:21~29, 字牌:31~37
    #[inline]
    pub fn general_id(&self) -> u8 {
        let kind = self.id / 4;
        kind / 9 * 10 + kind % 9 + 1
    }

    #[inline]
    pub fn number(&self) -> u8 {
        self.name().as_bytes()[0] - b'0'
    }

    #[inline]
    pub fn suit(&self) -> char {
        self.name().as_bytes()[1] as char
    }

    #[inline]
    pub fn is_red(&self) -> bool {
        self.name().len() > 2
    }

    #[inline]
    pub fn is_honor(&self) -> bool {
        self.suit() == 'z'
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.official_name())
    }
}

impl PartialOrd for Tile {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tile {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

// [TileRegistry]
// 名前から牌を生成する際に使用済みの物理インデックスを記録する
#[derive(Debug, Default, Clone)]
pub struct TileRegistry {
    used: BTreeSet<TileId>,
}

impl TileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_index(&self, id: TileId) -> Res<Tile> {
        Tile::new(id)
    }

    // "0m" は赤5のみ, "5m" は通常の5を優先して残っていなければ赤5
    pub fn by_name(&mut self, name: &str) -> Res<Tile> {
        let found = self
            .find_unused(|entry| entry == name)
            .or_else(|| {
                let b = name.as_bytes();
                if b.len() != 2 {
                    return None;
                }
                let red = format!("5{}*", b[1] as char);
                match b[0] {
                    b'0' | b'5' => self.find_unused(|entry| entry == red),
                    _ => None,
                }
            })
            .ok_or_else(|| Error::TileExhausted(name.to_string()))?;

        self.used.insert(found);
        Tile::new(found)
    }

    pub fn reset(&mut self) {
        self.used.clear();
    }

    pub fn is_used(&self, id: TileId) -> bool {
        self.used.contains(&id)
    }

    fn find_unused(&self, matches: impl Fn(&str) -> bool) -> Option<TileId> {
        (0..TILE_COUNT as TileId).find(|&i| matches(TILE_NAMES[i as usize]) && !self.is_used(i))
    }
}

#[test]
fn test_tile_table_round_trip() {
    let reg = TileRegistry::new();
    for i in 0..TILE_COUNT {
        let t = reg.by_index(i as TileId).unwrap();
        assert_eq!(t.id as usize, i);
        assert_eq!(t.name(), TILE_NAMES[i]);
        assert_eq!(t.general_name(), &TILE_NAMES[i][..2]);
    }
    assert!(reg.by_index(136).is_err());
}

#[test]
fn test_tile_properties() {
    let reg = TileRegistry::new();
    let red = reg.by_index(52).unwrap();
    assert!(red.is_red());
    assert_eq!(red.official_name(), "0p");
    assert_eq!(red.general_id(), 15);
    assert_eq!(red.number(), 5);
    assert_eq!(red.suit(), 'p');

    let chun = reg.by_index(135).unwrap();
    assert!(chun.is_honor());
    assert_eq!(chun.general_id(), 37);
    assert_eq!(chun.to_string(), "7z");
    assert_eq!(reg.by_index(35).unwrap().general_id(), 9);
    assert_eq!(reg.by_index(72).unwrap().general_id(), 21);
}

#[test]
fn test_by_name_allocation() {
    let mut reg = TileRegistry::new();

    let ids: Vec<TileId> = (0..4).map(|_| reg.by_name("1m").unwrap().id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3]);
    assert!(matches!(reg.by_name("1m"), Err(Error::TileExhausted(_))));

    assert_eq!(reg.by_name("0p").unwrap().id, 52);
    assert!(reg.by_name("0p").is_err());

    // 通常の5を使い切った後は赤5
    let fives: Vec<TileId> = (0..4).map(|_| reg.by_name("5s").unwrap().id).collect();
    assert_eq!(fives, vec![89, 90, 91, 88]);
    assert!(reg.by_name("5s").is_err());
    assert!(reg.by_name("xx").is_err());

    reg.reset();
    assert!(!reg.is_used(0));
    assert_eq!(reg.by_name("1m").unwrap().id, 0);
    assert_eq!(reg.by_name("0p").unwrap().id, 52);
}
