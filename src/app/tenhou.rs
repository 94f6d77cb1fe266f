use std::sync::mpsc;

use tracing::{debug, error, info, warn};

use crate::actor::{create_actor, Actor};
use crate::client::{PlatformClient, TenhouClient};
use crate::config::Config;
use crate::error::Res;
use crate::listener::{EventPrinter, Listener, ReplayWriter};
use crate::model::*;

// [App]
#[derive(Debug)]
pub struct TenhouApp {
    config: Config,
    console: bool,
    verbose: bool,
}

impl TenhouApp {
    pub fn new(config: Config, console: bool, verbose: bool) -> Self {
        Self {
            config,
            console,
            verbose,
        }
    }

    pub fn run(&mut self) -> Res {
        let mut actor = create_actor(&self.config.actor)?;
        info!("actor: {:?}", actor);

        let mut listeners: Vec<Box<dyn Listener>> = vec![Box::new(EventPrinter::new(self.verbose))];
        if let Some(path) = &self.config.replay_file {
            listeners.push(Box::new(ReplayWriter::new(path)));
        }

        let (tx, rx) = mpsc::channel();
        let client = TenhouClient::connect(&self.config, tx)?;
        if self.console {
            client.start_console();
        }
        client.login(&self.config.tenhou_id)?;

        let game = client.game();
        while let Ok(event) = rx.recv() {
            match &event {
                Notification::Login { succeeded: true, .. } => self.enter(&client)?,
                Notification::Login { succeeded: false, code } => {
                    error!(?code, "login failed");
                    client.close();
                }
                _ => {}
            }

            let cmd = {
                let g = game.read().unwrap_or_else(|e| e.into_inner());
                for l in &mut listeners {
                    l.notify_event(&g, &event);
                }
                actor.notify_event(&g, &event);
                actor.select(&g, &event)
            };

            if let Some(cmd) = cmd {
                debug!(%cmd, "actor");
                if let Err(e) = perform(&client, cmd) {
                    warn!("command failed: {}", e);
                }
            }

            if matches!(event, Notification::Close) {
                break;
            }
        }

        info!("session finished");
        Ok(())
    }

    // 個室が指定されていれば入室してから対局待ち
    fn enter(&self, client: &impl PlatformClient) -> Res {
        match self.config.private_room {
            Some(room) => {
                client.enter_private_room(room)?;
                client.join(room, self.config.game_type)
            }
            None => client.join(self.config.room, self.config.game_type),
        }
    }
}

// Actorが選んだコマンドを対応する操作として実行
pub fn perform(client: &dyn PlatformClient, cmd: Command) -> Res {
    use Command::*;
    match cmd {
        Helo { name } => client.login(&name),
        Join { room, game_type } => client.join(room, game_type),
        EnterPrivateRoom { room } => client.enter_private_room(room),
        NextReady => client.next_ready(),
        Bye => client.bye(),
        Pass => client.pass(),
        Discard(t) => client.discard(t),
        Pon(t0, t1) => client.pon(t0, t1),
        Minkan => client.minkan(),
        Chii(t0, t1) => client.chii(t0, t1),
        Ankan(t) => client.ankan(t),
        Kakan(t) => client.kakan(t),
        Ron => client.ron(),
        Tsumo => client.tsumo(),
        Ryuukyoku => client.ryuukyoku(),
        Nuku => client.nuku(),
        Reach(t) => client.reach(t),
        c @ (Heartbeat | Auth(_) | GoOk | Raw(_)) => {
            // セッション内部でのみ使用
            warn!("ignored command: {}", c);
            Ok(())
        }
    }
}
