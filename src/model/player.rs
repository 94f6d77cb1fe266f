use std::collections::BTreeSet;

use super::*;
use crate::util::misc::vec_to_string;

// 風 (場風, 自風)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    E,
    S,
    W,
    N,
}

impl Direction {
    pub fn from_index(i: usize) -> Self {
        [Direction::E, Direction::S, Direction::W, Direction::N][i % SEAT]
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct Player {
    pub seat: Seat,                 // 絶対座席
    pub direction: Direction,       // 自風 (局の間は不変)
    pub score: Score,               // 得点
    pub reached: bool,              // リーチ宣言済み
    pub hand: Vec<Tile>,            // 手牌 (自分の座席のみ)
    pub graveyard: Vec<Tile>,       // 捨て牌
    pub fuuro: Vec<Meld>,           // 鳴き一覧
    pub safe_tiles: BTreeSet<u8>,   // 現物 (general_id)
}

impl Player {
    pub fn new(seat: Seat) -> Self {
        Self {
            seat,
            ..Default::default()
        }
    }

    pub fn has_in_hand(&self, id: TileId) -> bool {
        self.hand.iter().any(|t| t.id == id)
    }

    // 手牌から牌を除去 見つからなければfalse
    pub fn remove_from_hand(&mut self, id: TileId) -> bool {
        match self.hand.iter().position(|t| t.id == id) {
            Some(i) => {
                self.hand.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn discarded(&self, id: TileId) -> Option<&Tile> {
        self.graveyard.iter().find(|t| t.id == id)
    }

    pub fn is_safe(&self, t: &Tile) -> bool {
        self.safe_tiles.contains(&t.general_id())
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "seat: {}, wind: {:?}, score: {}, reached: {}",
            self.seat, self.direction, self.score, self.reached,
        )?;
        let mut hand = self.hand.clone();
        hand.sort();
        writeln!(f, "hand: {}", vec_to_string(&hand))?;
        writeln!(f, "melds: {}", vec_to_string(&self.fuuro))?;
        write!(f, "discards: {}", vec_to_string(&self.graveyard))
    }
}
