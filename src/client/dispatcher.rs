use std::sync::{Arc, RwLockWriteGuard};

use tracing::{debug, error, info, warn};

use super::session::{ClientState, Session};
use crate::convert::meld::{decode_meld, parse_meld_code};
use crate::convert::tag::{classify, Tag};
use crate::convert::xml::{parse_element, parse_list, parse_num, Element};
use crate::error::{Error, Res};
use crate::model::*;
use crate::util::auth::auth_response;

// 受信メッセージを解析して状態に反映し, 通知を発行する
// GameDataに書き込むのはこの構造体のみ
pub struct Dispatcher {
    session: Arc<Session>,
    game: GameRef,
}

impl Dispatcher {
    pub fn new(session: Arc<Session>, game: GameRef) -> Self {
        Self { session, game }
    }

    pub fn handle(&mut self, fragment: &str) {
        if let Err(e) = self.handle_fragment(fragment) {
            if e.is_transport() {
                error!("{}", e);
                self.session.close(true);
            } else {
                warn!("{}: {}", e, fragment.trim());
                self.session.notify(Notification::UnknownEvent {
                    message: format!("{}: {}", e, fragment.trim()),
                });
            }
        }
    }

    fn handle_fragment(&mut self, fragment: &str) -> Res {
        let elem = match parse_element(fragment)? {
            Some(e) => e,
            None => return Ok(()),
        };
        self.session.watchdog().observe(&elem.name);

        match classify(&elem.name) {
            Tag::Helo => self.handler_helo(&elem),
            Tag::Err => self.handler_err(&elem),
            Tag::Rejoin => self.handler_rejoin(fragment),
            Tag::Go => self.session.send(&Command::GoOk),
            Tag::Taikyoku => self.handler_taikyoku(&elem),
            Tag::Saikai => self.handler_saikai(),
            Tag::Init => self.handler_init(&elem, false),
            Tag::Reinit => self.handler_init(&elem, true),
            Tag::Dora => self.handler_dora(&elem),
            Tag::Meld => self.handler_meld(&elem),
            Tag::Reach => self.handler_reach(&elem),
            Tag::Agari => self.handler_agari(&elem),
            Tag::Ryuukyoku => self.handler_ryuukyoku(&elem),
            Tag::Draw { tile } => self.handler_draw(&elem, tile),
            Tag::OtherDraw { seat } => {
                debug!(seat, "draw");
                Ok(())
            }
            Tag::Discard {
                seat,
                tile,
                tsumogiri,
            } => self.handler_discard(&elem, seat, tile, tsumogiri),
            Tag::Ignored => Ok(()),
            Tag::Unknown => {
                self.session.notify(Notification::UnknownEvent {
                    message: fragment.trim().to_string(),
                });
                Ok(())
            }
        }
    }

    fn game_mut(&self) -> RwLockWriteGuard<'_, GameData> {
        self.game.write().unwrap_or_else(|e| e.into_inner())
    }

    fn handler_helo(&mut self, elem: &Element) -> Res {
        if elem.has("nintei") {
            // 新規IDの認定が必要 (クライアントからは続行できない)
            warn!("login requires nintei");
            self.session.close(true);
            return Ok(());
        }

        if let Some(auth) = elem.attr_nonempty("auth") {
            let val = auth_response(auth)?;
            self.session.send(&Command::Auth(val))?;
        }

        info!(uname = elem.attr("uname").unwrap_or(""), "logged in");
        self.session.set_state(ClientState::Lobby);
        self.session.notify(Notification::Login {
            succeeded: true,
            code: None,
        });
        Ok(())
    }

    fn handler_err(&mut self, elem: &Element) -> Res {
        let code = elem.attr("code").map(|s| s.to_string());
        warn!(?code, "login rejected");
        self.session.notify(Notification::Login {
            succeeded: false,
            code,
        });
        Ok(())
    }

    fn handler_rejoin(&mut self, fragment: &str) -> Res {
        let msg = fragment.trim().replacen("REJOIN", "JOIN", 1);
        self.session.send(&Command::Raw(msg))
    }

    fn handler_taikyoku(&mut self, elem: &Element) -> Res {
        let oya: Seat = match elem.attr_nonempty("oya") {
            Some(s) => seat(parse_num(s)?)?,
            None => 0,
        };
        let table_wind = (SEAT - oya) % SEAT;
        let log_id = elem.attr_nonempty("log").map(|s| s.to_string());

        self.session.send(&Command::NextReady)?;
        info!(?log_id, table_wind, "game start");
        self.session.set_state(ClientState::InHand);
        self.session.notify(Notification::GameStart {
            resumed: false,
            log_id,
            table_wind,
        });
        Ok(())
    }

    fn handler_saikai(&mut self) -> Res {
        info!("game resumed");
        self.session.set_state(ClientState::InHand);
        self.session.notify(Notification::GameStart {
            resumed: true,
            log_id: None,
            table_wind: 0,
        });
        Ok(())
    }

    fn handler_init(&mut self, elem: &Element, resync: bool) -> Res {
        let init = parse_init(elem)?;
        let mut g = GameData::from_init(&init)?;

        if resync {
            for s in 0..SEAT {
                if let Some(kawa) = elem.attr(&format!("kawa{}", s)) {
                    g.replay_discards(s, &parse_list::<u32>(kawa)?)?;
                }
            }
            for s in 0..SEAT {
                if let Some(m) = elem.attr(&format!("m{}", s)) {
                    for code in parse_list::<u32>(m)? {
                        let code = u16::try_from(code)
                            .map_err(|_| Error::InvalidNumber(code.to_string()))?;
                        g.apply_meld(s, &decode_meld(code)?);
                    }
                }
            }
        }

        let (direction, seq, honba, dealer) = (g.direction, g.seq, g.honba, g.dealer());
        *self.game_mut() = g;
        info!(?direction, seq, honba, dealer, resync, "hand start");
        self.session.set_state(ClientState::InHand);
        self.session.notify(Notification::Init {
            resync,
            direction,
            seq,
            honba,
        });
        Ok(())
    }

    fn handler_draw(&mut self, elem: &Element, tile: u32) -> Res {
        let id = tile_id(tile)?;
        let actions: Option<u32> = match elem.attr_nonempty("t") {
            Some(t) => Some(parse_num(t)?),
            None => None,
        };
        let tile = self.game_mut().draw(id)?;
        self.session.notify(Notification::Draw { tile, actions });
        Ok(())
    }

    fn handler_discard(&mut self, elem: &Element, seat: Seat, tile: u32, tsumogiri: bool) -> Res {
        let id = tile_id(tile)?;
        let tile = self.game_mut().discard(seat, id, tsumogiri)?;
        self.session.notify(Notification::Discard {
            seat,
            tile,
            tsumogiri,
            callable: elem.has("t"),
        });
        Ok(())
    }

    fn handler_dora(&mut self, elem: &Element) -> Res {
        let id = tile_id(elem.require_num("hai")?)?;
        let tile = self.game_mut().add_dora(id)?;
        self.session.notify(Notification::Dora { tile });
        Ok(())
    }

    fn handler_meld(&mut self, elem: &Element) -> Res {
        // 自分への鳴き選択肢の問い合わせ (who, mなし) は無視
        if !elem.has("m") {
            return Ok(());
        }
        let seat = seat(elem.require_num("who")?)?;
        let meld = decode_meld(parse_meld_code(elem.require("m")?)?)?;
        self.game_mut().apply_meld(seat, &meld);
        self.session.notify(Notification::Meld { seat, meld });
        Ok(())
    }

    fn handler_reach(&mut self, elem: &Element) -> Res {
        let seat = seat(elem.require_num("who")?)?;
        let step: u32 = match elem.attr_nonempty("step") {
            Some(s) => parse_num(s)?,
            None => 1,
        };

        if step == 2 {
            let scores = match elem.attr_nonempty("ten") {
                Some(ten) => Some(to_scores(&parse_list::<Score>(ten)?)?),
                None => None,
            };
            self.game_mut().accept_reach(scores);
            return Ok(());
        }

        self.game_mut().declare_reach(seat);
        self.session.notify(Notification::Reach { seat });
        Ok(())
    }

    fn handler_agari(&mut self, elem: &Element) -> Res {
        let who = seat(elem.require_num("who")?)?;
        let from_who = seat(elem.require_num("fromWho")?)?;
        let ten = parse_list::<Score>(elem.require("ten")?)?;
        let point = ten.get(1).copied().unwrap_or(0);
        let sc = parse_list::<i32>(elem.require("sc")?)?;

        let (deltas, scores) = {
            let mut g = self.game_mut();
            if let Some(id) = g.last_tile {
                g.mark_taken(id);
            }
            let deltas = g.apply_hand_end(&sc)?;
            (deltas, g.scores())
        };
        let yakuman = is_yakuman(&deltas);
        info!(who, from_who, point, yakuman, "agari");
        self.session.notify(Notification::Agari {
            who,
            from_who,
            point,
            deltas,
            scores,
            yakuman,
        });
        self.end_hand(elem)
    }

    fn handler_ryuukyoku(&mut self, elem: &Element) -> Res {
        let sc = parse_list::<i32>(elem.require("sc")?)?;
        let (deltas, scores) = {
            let mut g = self.game_mut();
            let deltas = g.apply_hand_end(&sc)?;
            (deltas, g.scores())
        };
        let yakuman = is_yakuman(&deltas);
        info!(kind = elem.attr("type").unwrap_or(""), yakuman, "ryuukyoku");
        self.session.notify(Notification::Ryuukyoku {
            deltas,
            scores,
            yakuman,
        });
        self.end_hand(elem)
    }

    // owari属性があれば対局終了
    fn end_hand(&mut self, elem: &Element) -> Res {
        if !elem.has("owari") {
            return self.session.send(&Command::NextReady);
        }

        info!(owari = elem.attr("owari").unwrap_or(""), "game end");
        self.session.send(&Command::Bye)?;
        self.session.set_state(ClientState::Lobby);
        self.session.notify(Notification::GameEnd);
        self.session.close(false);
        Ok(())
    }
}

fn tile_id(n: u32) -> Res<TileId> {
    if n as usize >= TILE_COUNT {
        return Err(Error::TileOutOfRange(n));
    }
    Ok(n as TileId)
}

fn seat(n: Seat) -> Res<Seat> {
    if n >= SEAT {
        return Err(Error::InvalidNumber(format!("seat: {}", n)));
    }
    Ok(n)
}

// 100点単位の4人分の点数
fn to_scores(v: &[Score]) -> Res<[Score; SEAT]> {
    if v.len() < SEAT {
        return Err(Error::InvalidNumber(format!("{:?}", v)));
    }
    let mut scores = [0; SEAT];
    for s in 0..SEAT {
        scores[s] = to_points(v[s])?;
    }
    Ok(scores)
}

fn is_yakuman(deltas: &[Score; SEAT]) -> bool {
    deltas.iter().any(|&d| d >= YAKUMAN_DELTA)
}

fn parse_init(elem: &Element) -> Res<InitData> {
    let seed = parse_list::<u32>(elem.require("seed")?)?;
    if seed.len() < 6 {
        return Err(Error::InvalidNumber(format!("seed: {:?}", seed)));
    }
    let hand = parse_list::<u32>(elem.require("hai")?)?
        .into_iter()
        .map(tile_id)
        .collect::<Res<Vec<TileId>>>()?;

    Ok(InitData {
        round: seed[0],
        honba: seed[1],
        reach_sticks: seed[2],
        dora: tile_id(seed[5])?,
        scores: to_scores(&parse_list::<Score>(elem.require("ten")?)?)?,
        dealer: seat(elem.require_num("oya")?)?,
        hand,
    })
}

#[cfg(test)]
use super::session::mock_session;

#[cfg(test)]
fn setup() -> (
    Dispatcher,
    Arc<crate::util::connection::MockTransport>,
    std::sync::mpsc::Receiver<Notification>,
) {
    let (s, mock, rx) = mock_session();
    let game: GameRef = Default::default();
    (Dispatcher::new(s, game), mock, rx)
}

#[cfg(test)]
const INIT: &str = r#"<INIT seed="0,0,0,3,4,12" ten="250,250,250,250" oya="0" hai="0,4,8,16,20,24,36,40,44,52,89,90,100"/>"#;

#[test]
fn test_hand_flow() {
    let (mut d, mock, rx) = setup();
    d.handle(INIT);
    {
        let g = d.game.read().unwrap();
        assert_eq!(g.player().hand.len(), 13);
        assert_eq!(g.dora[0].id, 12);
        assert_eq!(g.players[0].direction, Direction::E);
    }

    d.handle(r#"<T60 t="16"/>"#);
    d.handle("<D60/>");
    d.handle("<U/>");
    d.handle("<e91/>");
    d.handle(r#"<DORA hai="33" />"#);
    {
        let g = d.game.read().unwrap();
        assert_eq!(g.player().hand.len(), 13);
        assert_eq!(g.remaining_tile, INITIAL_WALL - 2);
        assert_eq!(g.dora.len(), 2);
    }

    // 下家(1)の捨て牌91を自分がポン (kui=1)
    d.handle(r#"<N who="0" m="34825" />"#);
    {
        let g = d.game.read().unwrap();
        assert!(g.players[1].discarded(91).unwrap().taken);
        assert_eq!(g.player().fuuro.len(), 1);
        assert_eq!(g.player().hand.len(), 11);
        assert_eq!(g.remaining_tile, INITIAL_WALL - 2);
    }

    d.handle(r#"<AGARI ba="0,0" hai="0,4,8" ten="30,7700,0" who="0" fromWho="2" sc="250,77,250,0,250,-77,250,0" />"#);
    {
        let g = d.game.read().unwrap();
        // scの各組は(局開始時の点数, 増減)
        assert_eq!(g.scores(), [25000; SEAT]);
    }
    assert_eq!(mock.sent(), vec!["<NEXTREADY />"]);
    assert!(d.session.is_connected());

    let events: Vec<Notification> = rx.try_iter().collect();
    assert!(matches!(events[0], Notification::Init { resync: false, seq: 1, .. }));
    assert!(matches!(events[1], Notification::Draw { actions: Some(16), .. }));
    assert!(matches!(events[2], Notification::Discard { seat: 0, tsumogiri: false, .. }));
    assert!(matches!(events[3], Notification::Discard { seat: 1, tsumogiri: true, .. }));
    assert!(matches!(events[4], Notification::Dora { .. }));
    assert!(matches!(events[5], Notification::Meld { seat: 0, .. }));
    match &events[6] {
        Notification::Agari {
            who,
            from_who,
            point,
            deltas,
            yakuman,
            ..
        } => {
            assert_eq!((*who, *from_who, *point), (0, 2, 7700));
            assert_eq!(*deltas, [7700, 0, -7700, 0]);
            assert!(!yakuman);
        }
        n => panic!("unexpected: {:?}", n),
    }
    assert_eq!(events.len(), 7);
}

#[test]
fn test_reinit() {
    let (mut d, _mock, rx) = setup();
    d.handle(
        r#"<REINIT seed="4,1,1,3,4,12" ten="250,240,250,250" oya="1" hai="0,4,8,16,20,24,36,40,44,52" m0="34825" kawa1="91,255,93" kawa2="120"/>"#,
    );
    let g = d.game.read().unwrap();
    assert_eq!(g.direction, Direction::S);
    assert_eq!(g.seq, 1);
    assert_eq!(g.reach_sticks, 1);
    assert!(g.players[1].reached);
    assert_eq!(g.players[1].graveyard.len(), 2);
    // 鳴かれた牌は二重に追加されない
    assert!(g.players[1].discarded(91).unwrap().taken);
    assert_eq!(g.remaining_tile, INITIAL_WALL - 3);
    assert_eq!(g.player().fuuro.len(), 1);
    assert_eq!(g.players[1].direction, Direction::E);
    assert!(matches!(
        rx.try_recv().unwrap(),
        Notification::Init { resync: true, .. }
    ));
}

#[test]
fn test_reach_steps() {
    let (mut d, _mock, rx) = setup();
    d.handle(INIT);
    d.handle("<E70/>");
    d.handle(r#"<REACH who="2" step="1"/>"#);
    d.handle(r#"<REACH who="2" ten="250,250,240,250" step="2"/>"#);
    let g = d.game.read().unwrap();
    assert!(g.players[2].reached);
    assert!(g.players[2].safe_tiles.is_empty());
    assert_eq!(g.reach_sticks, 1);
    assert_eq!(g.players[2].score, 24000);
    let reaches = rx
        .try_iter()
        .filter(|n| matches!(n, Notification::Reach { seat: 2 }))
        .count();
    assert_eq!(reaches, 1);
}

#[test]
fn test_lobby_messages() {
    let (mut d, mock, rx) = setup();
    d.handle(r#"<HELO uname="%4E%6F%4E%61%6D%65" auth="20180117-e7b2ad8a" ratingscale=""/>"#);
    d.handle(r#"<REJOIN t="0,1,r" />"#);
    d.handle(r#"<GO type="1" lobby="0" gpid=""/>"#);
    d.handle(r#"<TAIKYOKU oya="1" log="2024010100gm-0001-0000-abcdef01"/>"#);
    d.handle(r#"<LN n="1" j="2" g="3"/>"#);
    d.handle("plain text");
    d.handle(r#"<ERR code="1001"/>"#);

    assert_eq!(
        mock.sent(),
        vec![
            r#"<AUTH val="20180117-c1ecf7db"/>"#,
            r#"<JOIN t="0,1,r" />"#,
            "<GOK />",
            "<NEXTREADY />",
        ]
    );
    assert_eq!(d.session.state(), ClientState::InHand);

    let events: Vec<Notification> = rx.try_iter().collect();
    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], Notification::Login { succeeded: true, .. }));
    match &events[1] {
        Notification::GameStart {
            resumed,
            log_id,
            table_wind,
        } => {
            assert!(!resumed);
            assert_eq!(log_id.as_deref(), Some("2024010100gm-0001-0000-abcdef01"));
            assert_eq!(*table_wind, 3);
        }
        n => panic!("unexpected: {:?}", n),
    }
    assert!(matches!(
        &events[2],
        Notification::Login { succeeded: false, code: Some(c) } if c == "1001"
    ));
}

#[test]
fn test_nintei_closes() {
    let (mut d, _mock, rx) = setup();
    d.handle(r#"<HELO nintei="1" />"#);
    assert!(!d.session.is_connected());
    let events: Vec<Notification> = rx.try_iter().collect();
    assert!(matches!(
        events.as_slice(),
        [Notification::ConnectionLost, Notification::Close]
    ));
}

#[test]
fn test_malformed_and_unknown() {
    let (mut d, _mock, rx) = setup();
    d.handle("<INIT seed=");
    d.handle(r#"<XYZ a="1"/>"#);
    d.handle("<T200/>");
    d.handle(r#"<N who="1" m="70000" />"#);
    assert!(d.session.is_connected());
    let events: Vec<Notification> = rx.try_iter().collect();
    assert_eq!(events.len(), 4);
    assert!(events
        .iter()
        .all(|n| matches!(n, Notification::UnknownEvent { .. })));
}

#[test]
fn test_owari_ends_game() {
    let (mut d, mock, rx) = setup();
    d.handle(INIT);
    d.handle(
        r#"<RYUUKYOKU ba="0,0" sc="250,0,250,0,250,0,250,0" owari="250,0.0,250,0.0,250,0.0,250,0.0" />"#,
    );
    assert_eq!(mock.sent(), vec!["<BYE />"]);
    assert!(!d.session.is_connected());
    let events: Vec<Notification> = rx.try_iter().collect();
    let tail: Vec<&Notification> = events.iter().rev().take(2).collect();
    assert!(matches!(tail[0], Notification::Close));
    assert!(matches!(tail[1], Notification::GameEnd));
    assert!(!events
        .iter()
        .any(|n| matches!(n, Notification::ConnectionLost)));
}

#[test]
fn test_yakuman_flag() {
    let (mut d, _mock, rx) = setup();
    d.handle(INIT);
    d.handle(r#"<AGARI ten="40,32000,5" who="1" fromWho="1" sc="250,-80,250,320,250,-160,250,-80" />"#);
    let yakuman = rx
        .try_iter()
        .any(|n| matches!(n, Notification::Agari { yakuman: true, .. }));
    assert!(yakuman);
}

#[test]
fn test_invalid_meld_keeps_session() {
    let (mut d, mock, rx) = setup();
    d.handle(INIT);
    // 字牌の順子になるチー
    d.handle(r#"<N who="1" m="64516" />"#);
    assert!(d.session.is_connected());
    assert!(d.game.read().unwrap().players[1].fuuro.is_empty());
    assert!(mock.sent().is_empty());
    let events: Vec<Notification> = rx.try_iter().collect();
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[1], Notification::UnknownEvent { message } if message.contains("64516")));
}

#[test]
fn test_score_overflow() {
    let (mut d, mock, rx) = setup();
    d.handle(r#"<INIT seed="0,0,0,3,4,12" ten="30000000,250,250,250" oya="0" hai="0,4,8"/>"#);
    d.handle(INIT);
    d.handle(r#"<RYUUKYOKU ba="0,0" sc="30000000,0,250,0,250,0,250,0" />"#);
    assert!(d.session.is_connected());
    assert_eq!(d.game.read().unwrap().scores(), [25000; SEAT]);
    // NEXTREADYは送らない
    assert!(mock.sent().is_empty());
    let events: Vec<Notification> = rx.try_iter().collect();
    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], Notification::UnknownEvent { .. }));
    assert!(matches!(events[1], Notification::Init { .. }));
    assert!(matches!(events[2], Notification::UnknownEvent { .. }));
}

#[test]
fn test_seat_out_of_range() {
    let (mut d, _mock, rx) = setup();
    d.handle(INIT);
    d.handle(r#"<REACH who="5" step="1"/>"#);
    d.handle(r#"<N who="4" m="34825" />"#);
    d.handle(r#"<AGARI ten="30,1000,0" who="1" fromWho="6" sc="250,10,250,-10,250,0,250,0" />"#);
    d.handle(r#"<INIT seed="0,0,0,3,4,12" ten="250,250,250,250" oya="4" hai="0,4,8"/>"#);
    assert!(d.session.is_connected());
    {
        let g = d.game.read().unwrap();
        assert!(g.players.iter().all(|p| !p.reached && p.fuuro.is_empty()));
        assert_eq!(g.player().hand.len(), 13);
    }
    let events: Vec<Notification> = rx.try_iter().skip(1).collect();
    assert_eq!(events.len(), 4);
    assert!(events
        .iter()
        .all(|n| matches!(n, Notification::UnknownEvent { .. })));
}
