// タグ受信待ちのタイムアウト監視
// 監視は世代番号をキーに1つのテーブルで管理し, 1本のスレッドが最も早い期限まで待機する
use std::collections::BTreeMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

type ExpireCallback = Box<dyn Fn(&str) + Send + Sync>;

#[derive(Debug)]
struct Watch {
    tags: Vec<String>,
    deadline: Instant,
    message: String,
}

#[derive(Debug, Default)]
struct WatchState {
    next_generation: u64,
    watches: BTreeMap<u64, Watch>,
    stopped: bool,
}

struct Shared {
    state: Mutex<WatchState>,
    cond: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, WatchState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct Watchdog {
    shared: Arc<Shared>,
}

impl Watchdog {
    pub fn new(on_expire: impl Fn(&str) + Send + Sync + 'static) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(WatchState::default()),
            cond: Condvar::new(),
        });
        let s = shared.clone();
        let cb: ExpireCallback = Box::new(on_expire);
        thread::spawn(move || run(s, cb));
        Self { shared }
    }

    // tagsのいずれかをtimeout以内に受信しなければmessageで期限切れ
    pub fn expect(&self, tags: &[&str], timeout: Duration, message: &str) -> u64 {
        let mut st = self.shared.lock();
        let gen = st.next_generation;
        st.next_generation += 1;
        st.watches.insert(
            gen,
            Watch {
                tags: tags.iter().map(|t| t.to_string()).collect(),
                deadline: Instant::now() + timeout,
                message: message.to_string(),
            },
        );
        debug!(gen, ?tags, ?timeout, "watch");
        self.shared.cond.notify_all();
        gen
    }

    // tagを含む監視をすべて解除
    pub fn observe(&self, tag: &str) {
        let mut st = self.shared.lock();
        let before = st.watches.len();
        st.watches.retain(|_, w| !w.tags.iter().any(|t| t == tag));
        if st.watches.len() != before {
            debug!(tag, "watch satisfied");
            self.shared.cond.notify_all();
        }
    }

    pub fn cancel(&self, gen: u64) {
        let mut st = self.shared.lock();
        if st.watches.remove(&gen).is_some() {
            self.shared.cond.notify_all();
        }
    }

    pub fn cancel_all(&self) {
        let mut st = self.shared.lock();
        st.watches.clear();
        self.shared.cond.notify_all();
    }

    pub fn pending(&self) -> usize {
        self.shared.lock().watches.len()
    }

    pub fn stop(&self) {
        let mut st = self.shared.lock();
        st.stopped = true;
        st.watches.clear();
        self.shared.cond.notify_all();
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(shared: Arc<Shared>, on_expire: ExpireCallback) {
    let mut st = shared.lock();
    loop {
        if st.stopped {
            return;
        }

        let now = Instant::now();
        let expired: Vec<u64> = st
            .watches
            .iter()
            .filter(|(_, w)| w.deadline <= now)
            .map(|(&g, _)| g)
            .collect();
        if !expired.is_empty() {
            let messages: Vec<String> = expired
                .iter()
                .filter_map(|g| st.watches.remove(g))
                .map(|w| w.message)
                .collect();
            // コールバック中にcancel_allなどが呼ばれるためロックを外す
            drop(st);
            for m in &messages {
                warn!(message = m.as_str(), "watch expired");
                on_expire(m);
            }
            st = shared.lock();
            continue;
        }

        let next = st.watches.values().map(|w| w.deadline).min();
        st = match next {
            Some(deadline) => {
                let (g, _) = shared
                    .cond
                    .wait_timeout(st, deadline.saturating_duration_since(now))
                    .unwrap_or_else(|e| e.into_inner());
                g
            }
            None => shared.cond.wait(st).unwrap_or_else(|e| e.into_inner()),
        };
    }
}

#[cfg(test)]
fn channel_watchdog() -> (Watchdog, std::sync::mpsc::Receiver<String>) {
    let (tx, rx) = std::sync::mpsc::channel();
    let tx = Mutex::new(tx);
    let wd = Watchdog::new(move |m| {
        tx.lock().unwrap().send(m.to_string()).ok();
    });
    (wd, rx)
}

#[test]
fn test_watchdog_expire() {
    let (wd, rx) = channel_watchdog();
    wd.expect(&["GO"], Duration::from_millis(300), "Game matching timed out.");
    wd.expect(&["HELO", "GO"], Duration::from_millis(50), "Login timed out.");

    let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(first, "Login timed out.");
    let second = rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(second, "Game matching timed out.");
    assert_eq!(wd.pending(), 0);
}

#[test]
fn test_watchdog_observe_and_cancel() {
    let (wd, rx) = channel_watchdog();
    wd.expect(&["HELO", "GO"], Duration::from_millis(100), "Login timed out.");
    wd.expect(&["GO"], Duration::from_millis(100), "Game matching timed out.");
    let g = wd.expect(&["INIT"], Duration::from_millis(100), "init");
    assert_eq!(wd.pending(), 3);

    wd.observe("HELO");
    assert_eq!(wd.pending(), 2);
    wd.cancel(g);
    assert_eq!(wd.pending(), 1);
    wd.observe("GO");
    assert_eq!(wd.pending(), 0);
    assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());

    wd.expect(&["GO"], Duration::from_millis(50), "x");
    wd.cancel_all();
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
}
