use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, Weak};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::error::{Error, Res};
use crate::model::*;
use crate::util::connection::{read_frame, split_frame, Transport};
use crate::util::watchdog::Watchdog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Disconnected,
    AwaitingLogin,
    Lobby,
    InHand,
    Closed,
}

// 接続1本分の送受信と終了処理
pub struct Session {
    transport: Box<dyn Transport>,
    close_lock: Mutex<()>,
    connected: AtomicBool,
    state: Mutex<ClientState>,
    watchdog: Watchdog,
    tx: Mutex<Sender<Notification>>,
}

impl Session {
    pub fn new(transport: Box<dyn Transport>, tx: Sender<Notification>) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Session>| {
            let w = weak.clone();
            let watchdog = Watchdog::new(move |message| {
                if let Some(s) = w.upgrade() {
                    s.notify(Notification::UnknownEvent {
                        message: message.to_string(),
                    });
                    s.close(true);
                }
            });
            Self {
                transport,
                close_lock: Mutex::new(()),
                connected: AtomicBool::new(true),
                state: Mutex::new(ClientState::Disconnected),
                watchdog,
                tx: Mutex::new(tx),
            }
        })
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> ClientState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_state(&self, state: ClientState) {
        let mut st = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *st != ClientState::Closed && *st != state {
            debug!(from = ?*st, to = ?state, "state");
            *st = state;
        }
    }

    #[inline]
    pub fn watchdog(&self) -> &Watchdog {
        &self.watchdog
    }

    pub fn notify(&self, n: Notification) {
        let tx = self.tx.lock().unwrap_or_else(|e| e.into_inner());
        // 受信側が先に終了している場合は捨てる
        tx.send(n).ok();
    }

    pub fn send(&self, cmd: &Command) -> Res {
        self.send_raw(&cmd.to_string())
    }

    // 送信に失敗した場合は異常終了
    pub fn send_raw(&self, msg: &str) -> Res {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        debug!(msg, "send");
        if let Err(e) = self.transport.send(msg) {
            error!("send failed: {}", e);
            self.close(true);
            return Err(e);
        }
        Ok(())
    }

    // 2回目以降の呼び出しは何もしない
    pub fn close(&self, unexpected: bool) {
        let _guard = self.close_lock.lock().unwrap_or_else(|e| e.into_inner());
        if !self.connected.swap(false, Ordering::SeqCst) {
            return;
        }

        let pending = self.watchdog.pending();
        if unexpected {
            warn!(pending, "connection lost");
        } else {
            info!(pending, "closing session");
        }
        self.watchdog.cancel_all();
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = ClientState::Closed;
        if unexpected {
            self.notify(Notification::ConnectionLost);
        }
        self.notify(Notification::Close);
        self.transport.close();
    }

    // 受信ループ 1メッセージごとにhandlerを呼び出す
    pub fn spawn_receiver(
        self: &Arc<Self>,
        frame_timeout: Duration,
        mut handler: impl FnMut(&str) + Send + 'static,
    ) -> thread::JoinHandle<()> {
        let s = self.clone();
        thread::spawn(move || {
            while s.is_connected() {
                let frame = match read_frame(s.transport.as_ref(), frame_timeout) {
                    Ok(f) => f,
                    Err(e) => {
                        if s.is_connected() {
                            error!("receive failed: {}", e);
                            s.close(true);
                        }
                        break;
                    }
                };
                for msg in split_frame(&frame) {
                    debug!(msg, "recv");
                    handler(msg);
                    if !s.is_connected() {
                        break;
                    }
                }
            }
            debug!("receiver stopped");
        })
    }

    pub fn spawn_heartbeat(self: &Arc<Self>, interval: Duration) -> thread::JoinHandle<()> {
        let w = Arc::downgrade(self);
        thread::spawn(move || loop {
            thread::sleep(interval);
            let Some(s) = w.upgrade() else {
                break;
            };
            if !s.is_connected() || s.send(&Command::Heartbeat).is_err() {
                break;
            }
        })
    }

    // 標準入力の各行をそのまま送信
    pub fn spawn_console(self: &Arc<Self>) -> thread::JoinHandle<()> {
        let w = Arc::downgrade(self);
        thread::spawn(move || {
            let stdin = std::io::stdin();
            let mut buf = String::new();
            loop {
                buf.clear();
                match stdin.read_line(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
                let line = buf.trim();
                if line.is_empty() {
                    continue;
                }
                let Some(s) = w.upgrade() else {
                    break;
                };
                if s.send(&Command::Raw(line.to_string())).is_err() {
                    break;
                }
            }
        })
    }
}

#[cfg(test)]
use crate::util::connection::MockTransport;

#[cfg(test)]
pub(crate) fn mock_session() -> (
    Arc<Session>,
    Arc<MockTransport>,
    std::sync::mpsc::Receiver<Notification>,
) {
    let mock = Arc::new(MockTransport::default());
    let (tx, rx) = std::sync::mpsc::channel();
    let s = Session::new(Box::new(mock.clone()), tx);
    (s, mock, rx)
}

#[test]
fn test_concurrent_close() {
    let (s, mock, rx) = mock_session();
    s.set_state(ClientState::InHand);
    s.watchdog().expect(&["GO"], Duration::from_secs(60), "Match timed out.");
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let s = s.clone();
            thread::spawn(move || s.close(i % 2 == 0))
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert!(!s.is_connected());
    assert_eq!(s.state(), ClientState::Closed);
    assert_eq!(s.watchdog().pending(), 0);
    assert_eq!(*mock.closed.lock().unwrap(), 1);
    let events: Vec<Notification> = rx.try_iter().collect();
    let closes = events
        .iter()
        .filter(|n| matches!(n, Notification::Close))
        .count();
    assert_eq!(closes, 1);
    assert!(matches!(events.last(), Some(Notification::Close)));
    assert!(matches!(s.send(&Command::Pass), Err(Error::NotConnected)));
}

#[test]
fn test_send_failure_closes() {
    let (s, mock, rx) = mock_session();
    s.send(&Command::NextReady).unwrap();
    assert_eq!(mock.sent(), vec!["<NEXTREADY />"]);

    *mock.closed.lock().unwrap() = 1;
    assert!(s.send(&Command::Pass).unwrap_err().is_transport());
    assert!(!s.is_connected());
    let events: Vec<Notification> = rx.try_iter().collect();
    assert!(matches!(
        events.as_slice(),
        [Notification::ConnectionLost, Notification::Close]
    ));
}

#[test]
fn test_watch_expiry_closes() {
    let (s, _mock, rx) = mock_session();
    s.watchdog()
        .expect(&["HELO", "GO"], Duration::from_millis(30), "Login timed out.");
    let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert!(matches!(first, Notification::UnknownEvent { ref message } if message == "Login timed out."));
    assert!(matches!(
        rx.recv_timeout(Duration::from_secs(2)).unwrap(),
        Notification::ConnectionLost
    ));
    assert!(matches!(
        rx.recv_timeout(Duration::from_secs(2)).unwrap(),
        Notification::Close
    ));
    assert!(!s.is_connected());
}

#[test]
fn test_heartbeat() {
    let (s, mock, rx) = mock_session();
    let h = s.spawn_heartbeat(Duration::from_millis(20));
    let start = std::time::Instant::now();
    while !mock.sent().iter().any(|m| m == "<Z />") {
        assert!(start.elapsed() < Duration::from_secs(2));
        thread::sleep(Duration::from_millis(5));
    }
    assert!(s.is_connected());

    // 送信失敗で異常終了し, ハートビートも止まる
    *mock.closed.lock().unwrap() = 1;
    assert!(matches!(
        rx.recv_timeout(Duration::from_secs(2)).unwrap(),
        Notification::ConnectionLost
    ));
    assert!(matches!(
        rx.recv_timeout(Duration::from_secs(2)).unwrap(),
        Notification::Close
    ));
    assert!(!s.is_connected());
    h.join().unwrap();
}
