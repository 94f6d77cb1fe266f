mod dispatcher;
mod session;

use std::sync::mpsc::Sender;
use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::error::Res;
use crate::model::*;
use crate::util::connection::{TcpTransport, Transport};

pub use dispatcher::Dispatcher;
pub use session::{ClientState, Session};

// 対局サーバーへの操作
// 結果はNotificationとして非同期に通知される
pub trait PlatformClient: Send + Sync {
    fn login(&self, name: &str) -> Res;
    fn join(&self, room: u32, game_type: u32) -> Res;
    fn enter_private_room(&self, room: u32) -> Res;
    fn next_ready(&self) -> Res;
    fn bye(&self) -> Res;
    fn pass(&self) -> Res;
    fn discard(&self, tile: TileId) -> Res;
    fn pon(&self, t0: TileId, t1: TileId) -> Res;
    fn minkan(&self) -> Res;
    fn chii(&self, t0: TileId, t1: TileId) -> Res;
    fn ankan(&self, tile: TileId) -> Res;
    fn kakan(&self, tile: TileId) -> Res;
    fn ron(&self) -> Res;
    fn tsumo(&self) -> Res;
    fn ryuukyoku(&self) -> Res;
    fn nuku(&self) -> Res;
    fn reach(&self, tile: TileId) -> Res;
    fn close(&self);
    fn game(&self) -> GameRef;
}

pub struct TenhouClient {
    session: Arc<Session>,
    game: GameRef,
    config: Config,
}

impl TenhouClient {
    pub fn connect(config: &Config, tx: Sender<Notification>) -> Res<Self> {
        info!(addr = config.addr().as_str(), "connecting");
        let transport = TcpTransport::connect(&config.addr())?;
        Ok(Self::with_transport(Box::new(transport), config, tx))
    }

    // 受信スレッドとハートビートを開始
    pub fn with_transport(
        transport: Box<dyn Transport>,
        config: &Config,
        tx: Sender<Notification>,
    ) -> Self {
        let session = Session::new(transport, tx);
        let game = GameRef::default();

        let mut dispatcher = Dispatcher::new(session.clone(), game.clone());
        session.spawn_receiver(config.frame_timeout(), move |msg| dispatcher.handle(msg));
        session.spawn_heartbeat(config.heartbeat());

        Self {
            session,
            game,
            config: config.clone(),
        }
    }

    pub fn start_console(&self) {
        self.session.spawn_console();
    }

    pub fn state(&self) -> ClientState {
        self.session.state()
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    #[inline]
    fn send(&self, cmd: Command) -> Res {
        self.session.send(&cmd)
    }
}

impl PlatformClient for TenhouClient {
    fn login(&self, name: &str) -> Res {
        self.session.set_state(ClientState::AwaitingLogin);
        // 応答が先に届く場合があるので送信前に監視を登録
        let gen = self.session.watchdog().expect(
            &["HELO", "GO"],
            self.config.login_timeout(),
            "Login timed out.",
        );
        self.send(Command::Helo {
            name: name.to_string(),
        })
        .inspect_err(|_| self.session.watchdog().cancel(gen))
    }

    fn join(&self, room: u32, game_type: u32) -> Res {
        let gen = (room == 0).then(|| {
            self.session.watchdog().expect(
                &["GO"],
                self.config.match_timeout(),
                "Game matching timed out.",
            )
        });
        self.send(Command::Join { room, game_type }).inspect_err(|_| {
            if let Some(gen) = gen {
                self.session.watchdog().cancel(gen);
            }
        })
    }

    fn enter_private_room(&self, room: u32) -> Res {
        self.send(Command::EnterPrivateRoom { room })
    }

    fn next_ready(&self) -> Res {
        self.send(Command::NextReady)
    }

    fn bye(&self) -> Res {
        self.send(Command::Bye)
    }

    fn pass(&self) -> Res {
        self.send(Command::Pass)
    }

    fn discard(&self, tile: TileId) -> Res {
        self.send(Command::Discard(tile))
    }

    fn pon(&self, t0: TileId, t1: TileId) -> Res {
        self.send(Command::Pon(t0, t1))
    }

    fn minkan(&self) -> Res {
        self.send(Command::Minkan)
    }

    fn chii(&self, t0: TileId, t1: TileId) -> Res {
        self.send(Command::Chii(t0, t1))
    }

    fn ankan(&self, tile: TileId) -> Res {
        self.send(Command::Ankan(tile))
    }

    fn kakan(&self, tile: TileId) -> Res {
        self.send(Command::Kakan(tile))
    }

    fn ron(&self) -> Res {
        self.send(Command::Ron)
    }

    fn tsumo(&self) -> Res {
        self.send(Command::Tsumo)
    }

    fn ryuukyoku(&self) -> Res {
        self.send(Command::Ryuukyoku)
    }

    fn nuku(&self) -> Res {
        self.send(Command::Nuku)
    }

    fn reach(&self, tile: TileId) -> Res {
        self.send(Command::Reach(tile))
    }

    fn close(&self) {
        self.session.close(false);
    }

    fn game(&self) -> GameRef {
        self.game.clone()
    }
}

impl Drop for TenhouClient {
    fn drop(&mut self) {
        self.session.close(false);
    }
}

#[test]
fn test_client_lost_connection() {
    use crate::util::connection::MockTransport;
    use std::time::Duration;

    let mock = Arc::new(MockTransport::default());
    mock.push("<HELO uname=\"NoName\" auth=\"20180117-e7b2ad8a\" />\0");
    let (tx, rx) = std::sync::mpsc::channel();
    let client = TenhouClient::with_transport(Box::new(mock.clone()), &Config::default(), tx);

    // 1フレーム処理した後, 受信が途切れて異常終了
    let events: Vec<Notification> = (0..3)
        .map(|_| rx.recv_timeout(Duration::from_secs(2)).unwrap())
        .collect();
    assert!(matches!(events[0], Notification::Login { succeeded: true, .. }));
    assert!(matches!(events[1], Notification::ConnectionLost));
    assert!(matches!(events[2], Notification::Close));

    assert!(!client.is_connected());
    assert_eq!(client.state(), ClientState::Closed);
    assert!(client.discard(10).unwrap_err().is_transport());
    assert_eq!(mock.sent(), vec![r#"<AUTH val="20180117-c1ecf7db"/>"#]);
}
