use std::io::prelude::*;
use std::net::{Shutdown, TcpStream};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::{Error, Res};

pub trait Transport: Send + Sync {
    fn send(&self, msg: &str) -> Res;
    // 受信したバイト列の塊 (メッセージ境界・文字境界とは一致しない)
    fn recv(&self) -> Res<Vec<u8>>;
    fn close(&self);
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, msg: &str) -> Res {
        (**self).send(msg)
    }

    fn recv(&self) -> Res<Vec<u8>> {
        (**self).recv()
    }

    fn close(&self) {
        (**self).close()
    }
}

impl std::fmt::Debug for dyn Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dyn Transport")
    }
}

// TCP
// メッセージは'\0'で終端する
pub struct TcpTransport {
    reader: Mutex<TcpStream>,
    writer: Mutex<TcpStream>,
}

impl TcpTransport {
    pub fn connect(addr: &str) -> Res<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        info!(addr, "tcp connection opened");
        let writer = stream.try_clone()?;
        Ok(Self {
            reader: Mutex::new(stream),
            writer: Mutex::new(writer),
        })
    }
}

impl Transport for TcpTransport {
    fn send(&self, msg: &str) -> Res {
        debug!(msg, "send");
        let mut w = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        w.write_all(msg.as_bytes())?;
        w.write_all(b"\0")?;
        w.flush()?;
        Ok(())
    }

    fn recv(&self) -> Res<Vec<u8>> {
        let mut buf = [0u8; 4096];
        let mut r = self.reader.lock().unwrap_or_else(|e| e.into_inner());
        let n = r.read(&mut buf)?;
        Ok(buf[..n].to_vec())
    }

    fn close(&self) {
        let w = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        w.shutdown(Shutdown::Both).ok();
        info!("tcp connection closed");
    }
}

// 1フレーム分を受信 ('\0'か'>'で終わるまで連結)
// 文字のデコードはフレーム単位で行う
pub fn read_frame(transport: &dyn Transport, timeout: Duration) -> Res<String> {
    let start = Instant::now();
    let mut frame: Vec<u8> = vec![];
    loop {
        let chunk = transport.recv()?;
        if chunk.is_empty() {
            return Err(Error::Transport(std::io::ErrorKind::UnexpectedEof.into()));
        }
        frame.extend_from_slice(&chunk);
        if start.elapsed() > timeout {
            return Err(Error::Transport(std::io::ErrorKind::TimedOut.into()));
        }
        if matches!(frame.last(), Some(b'\0' | b'>')) {
            return Ok(String::from_utf8_lossy(&frame).into_owned());
        }
    }
}

// 連結されたメッセージを'\0'で分割
pub fn split_frame(frame: &str) -> impl Iterator<Item = &str> {
    frame.split('\0').filter(|s| !s.is_empty())
}

// テスト用
// recvはpushされた塊を順に返し, 空になったら接続断として扱う
#[cfg(test)]
#[derive(Default)]
pub struct MockTransport {
    pub sent: Mutex<Vec<String>>,
    pub chunks: Mutex<std::collections::VecDeque<Vec<u8>>>,
    pub closed: Mutex<usize>,
}

#[cfg(test)]
impl MockTransport {
    pub fn push(&self, chunk: &str) {
        self.push_bytes(chunk.as_bytes());
    }

    pub fn push_bytes(&self, chunk: &[u8]) {
        self.chunks.lock().unwrap().push_back(chunk.to_vec());
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Transport for MockTransport {
    fn send(&self, msg: &str) -> Res {
        if *self.closed.lock().unwrap() > 0 {
            return Err(Error::Transport(std::io::ErrorKind::BrokenPipe.into()));
        }
        self.sent.lock().unwrap().push(msg.to_string());
        Ok(())
    }

    fn recv(&self) -> Res<Vec<u8>> {
        match self.chunks.lock().unwrap().pop_front() {
            Some(c) => Ok(c),
            None => Err(Error::Transport(std::io::ErrorKind::ConnectionReset.into())),
        }
    }

    fn close(&self) {
        *self.closed.lock().unwrap() += 1;
    }
}

#[test]
fn test_read_frame() {
    let t = MockTransport::default();
    t.push("<HELO uname=\"a\"");
    t.push(" />\0<LN n=\"1\" />\0");
    t.push("<T12/>\0<D12/>");
    let frame = read_frame(&t, Duration::from_secs(20)).unwrap();
    let msgs: Vec<&str> = split_frame(&frame).collect();
    assert_eq!(msgs, vec!["<HELO uname=\"a\" />", "<LN n=\"1\" />"]);

    let frame = read_frame(&t, Duration::from_secs(20)).unwrap();
    assert_eq!(split_frame(&frame).count(), 2);

    assert!(read_frame(&t, Duration::from_secs(20)).unwrap_err().is_transport());
}

#[test]
fn test_read_frame_timeout() {
    let t = MockTransport::default();
    t.push("<T1");
    t.push("2/>\0");
    let e = read_frame(&t, Duration::ZERO).unwrap_err();
    assert!(e.is_transport());
}

#[test]
fn test_read_frame_split_char() {
    // "牌"の3バイトが2回の受信に分かれる
    let t = MockTransport::default();
    let msg = "<UN n0=\"牌\" />\0".as_bytes();
    t.push_bytes(&msg[..10]);
    t.push_bytes(&msg[10..]);
    let frame = read_frame(&t, Duration::from_secs(20)).unwrap();
    let msgs: Vec<&str> = split_frame(&frame).collect();
    assert_eq!(msgs, vec!["<UN n0=\"牌\" />"]);
}
