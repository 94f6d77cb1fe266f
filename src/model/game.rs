use std::sync::{Arc, RwLock};

use super::*;
use crate::error::{Error, Res};
use crate::util::misc::vec_to_string;

// 受信スレッドのみが書き込み, Actor側は読み取りのみ
pub type GameRef = Arc<RwLock<GameData>>;

// INIT/REINITから取り出した局開始情報
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitData {
    pub round: u32,        // seedの先頭 (0~3: 東, 4~7: 南, ...)
    pub honba: u32,        // 本場
    pub reach_sticks: u32, // 供託
    pub dora: TileId,      // ドラ表示牌
    pub scores: [Score; SEAT],
    pub dealer: Seat,
    pub hand: Vec<TileId>, // 自分の配牌
}

#[derive(Debug, Clone, Serialize)]
pub struct GameData {
    pub players: [Player; SEAT],
    pub direction: Direction,     // 場風
    pub seq: u32,                 // 局 (1~4)
    pub honba: u32,               // 本場
    pub reach_sticks: u32,        // 供託
    pub dora: Vec<Tile>,          // ドラ表示牌
    pub remaining_tile: usize,    // 牌山の残り枚数
    pub last_tile: Option<TileId>, // 直前にツモ・打牌された牌
    pub self_seat: Seat,
    #[serde(skip)]
    pub registry: TileRegistry,
}

impl Default for GameData {
    fn default() -> Self {
        Self::new()
    }
}

impl GameData {
    pub fn new() -> Self {
        Self {
            players: [Player::new(0), Player::new(1), Player::new(2), Player::new(3)],
            direction: Direction::E,
            seq: 1,
            honba: 0,
            reach_sticks: 0,
            dora: vec![],
            remaining_tile: INITIAL_WALL,
            last_tile: None,
            self_seat: SELF_SEAT,
            registry: TileRegistry::new(),
        }
    }

    // 局開始 (全体を作り直す)
    pub fn from_init(init: &InitData) -> Res<Self> {
        let mut g = Self::new();
        g.registry.reset();
        g.direction = Direction::from_index(init.round as usize / 4);
        g.seq = init.round % 4 + 1;
        g.honba = init.honba;
        g.reach_sticks = init.reach_sticks;
        g.dora.push(g.registry.by_index(init.dora)?);

        for (s, p) in g.players.iter_mut().enumerate() {
            p.score = init.scores[s];
            p.direction = Direction::from_index(s + SEAT - init.dealer % SEAT);
        }

        for &id in &init.hand {
            let t = g.registry.by_index(id)?;
            g.players[g.self_seat].hand.push(t);
        }

        Ok(g)
    }

    #[inline]
    pub fn player(&self) -> &Player {
        &self.players[self.self_seat]
    }

    pub fn dealer(&self) -> Seat {
        self.players
            .iter()
            .position(|p| p.direction == Direction::E)
            .unwrap_or(0)
    }

    pub fn scores(&self) -> [Score; SEAT] {
        let mut scores = [0; SEAT];
        for s in 0..SEAT {
            scores[s] = self.players[s].score;
        }
        scores
    }

    // 直前の牌を現在の置き場所から参照 (捨て牌 -> 自分の手牌の順)
    pub fn last_tile(&self) -> Option<&Tile> {
        let id = self.last_tile?;
        self.players
            .iter()
            .find_map(|p| p.discarded(id))
            .or_else(|| self.player().hand.iter().find(|t| t.id == id))
    }

    // 捨て牌にある牌を鳴かれた状態にする
    pub fn mark_taken(&mut self, id: TileId) -> bool {
        for p in self.players.iter_mut() {
            if let Some(t) = p.graveyard.iter_mut().find(|t| t.id == id) {
                t.taken = true;
                return true;
            }
        }
        false
    }

    #[inline]
    fn consume_wall(&mut self) {
        self.remaining_tile = self.remaining_tile.saturating_sub(1);
    }

    // REINITの捨て牌リストを再生
    pub fn replay_discards(&mut self, seat: Seat, kawa: &[u32]) -> Res {
        for &d in kawa {
            if d == REACH_SENTINEL {
                self.players[seat].reached = true;
                continue;
            }
            if d as usize >= TILE_COUNT {
                return Err(Error::TileOutOfRange(d));
            }
            let t = self.registry.by_index(d as TileId)?;
            self.players[seat].graveyard.push(t);
            self.consume_wall();
        }
        Ok(())
    }

    // 自分のツモ
    pub fn draw(&mut self, id: TileId) -> Res<Tile> {
        let t = self.registry.by_index(id)?;
        let s = self.self_seat;
        self.players[s].hand.push(t);
        self.last_tile = Some(id);
        Ok(t)
    }

    pub fn discard(&mut self, seat: Seat, id: TileId, tsumogiri: bool) -> Res<Tile> {
        let t = self.registry.by_index(id)?;
        let pl = &mut self.players[seat];
        if !tsumogiri {
            // 手出しはツモ牌以外を選んだので現物の情報が無効になる
            pl.safe_tiles.clear();
        }
        if seat == self.self_seat {
            pl.remove_from_hand(id);
        }
        pl.graveyard.push(t);
        self.last_tile = Some(id);
        self.consume_wall();

        for p in self.players.iter_mut() {
            p.safe_tiles.insert(t.general_id());
        }
        Ok(t)
    }

    pub fn add_dora(&mut self, id: TileId) -> Res<Tile> {
        let t = self.registry.by_index(id)?;
        self.dora.push(t);
        Ok(t)
    }

    // 鳴きを反映 seatは鳴いたプレイヤーの絶対座席
    pub fn apply_meld(&mut self, seat: Seat, meld: &Meld) {
        if meld.meld_type.consumes_wall() {
            self.consume_wall();
        }

        if let Some(last) = self.last_tile {
            if meld.tiles.iter().any(|t| t.id == last) {
                self.mark_taken(last);
            }
        }

        if let Some(claimed) = meld.claimed() {
            let from = (seat + meld.from as usize) % SEAT;
            let victim = &mut self.players[from];
            match victim.graveyard.iter_mut().find(|t| t.id == claimed.id) {
                Some(t) => t.taken = true,
                None => {
                    // サーバーが捨て牌を送らない場合がある
                    victim.graveyard.push(Tile {
                        taken: true,
                        ..claimed
                    });
                    self.consume_wall();
                }
            }
        }

        let self_seat = self.self_seat;
        let pl = &mut self.players[seat];
        if meld.meld_type == MeldType::Kakan {
            let gid = meld.tiles[0].general_id();
            pl.fuuro.retain(|m| !m.is_pon_of(gid));
        }
        pl.fuuro.push(meld.clone());
        pl.safe_tiles.clear();

        if seat == self_seat {
            pl.hand.retain(|t| !meld.tiles.iter().any(|m| m.id == t.id));
        }
    }

    pub fn declare_reach(&mut self, seat: Seat) {
        let pl = &mut self.players[seat];
        pl.reached = true;
        pl.safe_tiles.clear();
    }

    // リーチ成立 (供託+1)
    pub fn accept_reach(&mut self, scores: Option<[Score; SEAT]>) {
        self.reach_sticks += 1;
        if let Some(scores) = scores {
            for s in 0..SEAT {
                self.players[s].score = scores[s];
            }
        }
    }

    // 局終了 scは(合計, 増減)x4 (100点単位)
    // 返り値は点数の増減
    pub fn apply_hand_end(&mut self, sc: &[i32]) -> Res<[Score; SEAT]> {
        if sc.len() < SEAT * 2 {
            return Err(Error::InvalidNumber(format!("sc: {}", vec_to_string(sc))));
        }
        let mut scores = [0; SEAT];
        let mut deltas = [0; SEAT];
        for s in 0..SEAT {
            scores[s] = to_points(sc[s * 2])?;
            deltas[s] = to_points(sc[s * 2 + 1])?;
        }
        for s in 0..SEAT {
            self.players[s].score = scores[s];
        }
        Ok(deltas)
    }
}

// 100点単位 -> 点
pub fn to_points(v: Score) -> Res<Score> {
    v.checked_mul(100)
        .ok_or_else(|| Error::InvalidNumber(format!("score overflow: {}", v)))
}

impl fmt::Display for GameData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "round: {:?}{}, honba: {}, reach_sticks: {}, wall: {}, dora: {}",
            self.direction,
            self.seq,
            self.honba,
            self.reach_sticks,
            self.remaining_tile,
            vec_to_string(&self.dora),
        )?;
        let boader = "-".to_string().repeat(80);
        write!(f, "{}", boader)?;
        for p in &self.players {
            writeln!(f)?;
            writeln!(f, "{}", p)?;
            write!(f, "{}", boader)?;
        }
        Ok(())
    }
}

#[cfg(test)]
fn init_data() -> InitData {
    InitData {
        round: 5,
        honba: 1,
        reach_sticks: 2,
        dora: 100,
        scores: [25000, 24000, 26000, 25000],
        dealer: 2,
        hand: vec![0, 4, 8, 12, 16, 20, 24, 28, 32, 36, 40, 44, 48],
    }
}

#[cfg(test)]
fn meld(meld_type: MeldType, ids: &[TileId], from: u8) -> Meld {
    Meld {
        meld_type,
        tiles: ids.iter().map(|&i| Tile::new(i).unwrap()).collect(),
        from,
    }
}

#[test]
fn test_init_roles_and_scores() {
    let g = GameData::from_init(&init_data()).unwrap();
    assert_eq!(g.direction, Direction::S);
    assert_eq!(g.seq, 2);
    assert_eq!(g.honba, 1);
    assert_eq!(g.reach_sticks, 2);
    assert_eq!(g.scores(), [25000, 24000, 26000, 25000]);
    let winds: Vec<Direction> = g.players.iter().map(|p| p.direction).collect();
    assert_eq!(winds, vec![Direction::W, Direction::N, Direction::E, Direction::S]);
    assert_eq!(g.dealer(), 2);
    assert_eq!(g.player().hand.len(), 13);
    assert_eq!(g.dora.len(), 1);
    assert_eq!(g.dora[0].id, 100);
    assert_eq!(g.remaining_tile, INITIAL_WALL);
}

#[test]
fn test_discard_updates_wall_and_graveyard() {
    let mut g = GameData::from_init(&init_data()).unwrap();
    g.discard(1, 70, false).unwrap();
    assert_eq!(g.remaining_tile, INITIAL_WALL - 1);
    let holders: Vec<Seat> = (0..SEAT).filter(|&s| g.players[s].discarded(70).is_some()).collect();
    assert_eq!(holders, vec![1]);
    assert_eq!(g.last_tile().map(|t| t.id), Some(70));
    assert!(g.players.iter().all(|p| p.is_safe(&Tile::new(71).unwrap())));

    // 自分の打牌は手牌から消える
    g.draw(60).unwrap();
    assert_eq!(g.player().hand.len(), 14);
    g.discard(0, 60, true).unwrap();
    assert_eq!(g.player().hand.len(), 13);
    assert!(!g.player().has_in_hand(60));
}

#[test]
fn test_hand_cut_clears_safe_tiles() {
    let mut g = GameData::from_init(&init_data()).unwrap();
    g.discard(2, 108, true).unwrap();
    g.discard(3, 112, false).unwrap();
    assert!(!g.players[3].is_safe(&Tile::new(109).unwrap()));
    assert!(g.players[3].is_safe(&Tile::new(113).unwrap()));
    assert!(g.players[2].is_safe(&Tile::new(109).unwrap()));

    g.declare_reach(2);
    assert!(g.players[2].reached);
    assert!(g.players[2].safe_tiles.is_empty());
}

#[test]
fn test_kakan_replaces_pon() {
    let mut g = GameData::from_init(&init_data()).unwrap();
    g.discard(2, 91, false).unwrap();
    let wall = g.remaining_tile;

    g.apply_meld(1, &meld(MeldType::Pon, &[91, 89, 90], KUI_RIGHT));
    assert!(g.players[2].discarded(91).unwrap().taken);
    assert_eq!(g.last_tile().map(|t| t.taken), Some(true));
    assert_eq!(g.remaining_tile, wall);

    g.apply_meld(1, &meld(MeldType::Kakan, &[91, 89, 90, 88], KUI_RIGHT));
    let fuuro = &g.players[1].fuuro;
    assert_eq!(fuuro.len(), 1);
    assert_eq!(fuuro[0].meld_type, MeldType::Kakan);
    assert_eq!(g.remaining_tile, wall - 1);
}

#[test]
fn test_meld_inserts_missing_claim() {
    let mut g = GameData::from_init(&init_data()).unwrap();
    // 自分が対面(2)から明槓 手牌の3枚が消える
    g.players[0].hand = [12, 13, 15, 60].iter().map(|&i| Tile::new(i).unwrap()).collect();
    g.apply_meld(0, &meld(MeldType::Minkan, &[14, 12, 13, 15], KUI_ACROSS));
    let claimed = g.players[2].discarded(14).unwrap();
    assert!(claimed.taken);
    assert_eq!(g.remaining_tile, INITIAL_WALL - 1);
    assert_eq!(g.player().hand.len(), 1);
}

#[test]
fn test_replay_discards_and_hand_end() {
    let mut g = GameData::from_init(&init_data()).unwrap();
    g.replay_discards(3, &[1, 255, 2]).unwrap();
    assert!(g.players[3].reached);
    assert_eq!(g.players[3].graveyard.len(), 2);
    assert_eq!(g.remaining_tile, INITIAL_WALL - 2);
    assert!(g.replay_discards(3, &[300]).is_err());

    let deltas = g
        .apply_hand_end(&[240, -10, 250, 0, 270, 10, 240, 0])
        .unwrap();
    assert_eq!(deltas, [-1000, 0, 1000, 0]);
    assert_eq!(g.scores(), [24000, 25000, 27000, 24000]);
    assert!(g.apply_hand_end(&[1, 2]).is_err());
}

#[test]
fn test_wall_never_negative() {
    let mut g = GameData::new();
    g.remaining_tile = 0;
    g.discard(1, 3, true).unwrap();
    assert_eq!(g.remaining_tile, 0);
}

#[test]
fn test_hand_end_overflow() {
    let mut g = GameData::from_init(&init_data()).unwrap();
    let r = g.apply_hand_end(&[30000000, 0, 250, 0, 250, 0, 250, 0]);
    assert!(matches!(r, Err(Error::InvalidNumber(_))));
    // 途中まで反映されない
    assert_eq!(g.scores(), [25000, 24000, 26000, 25000]);
    assert_eq!(to_points(-12).unwrap(), -1200);
}
