use clap::Parser;
use tracing::{error, info};

use tenhou_client::app::TenhouApp;
use tenhou_client::config::Config;

// 天鳳クライアント
#[derive(Debug, Parser)]
#[command(name = "tenhou-client", version)]
struct Cli {
    /// 設定ファイル (JSON)
    #[arg(short, long)]
    config: Option<String>,

    /// ログインID (省略時は設定ファイルの値)
    #[arg(long)]
    id: Option<String>,

    /// ロビー番号
    #[arg(long)]
    room: Option<u32>,

    /// 個室番号
    #[arg(long)]
    private_room: Option<u32>,

    /// JOINの対局種別
    #[arg(long)]
    game_type: Option<u32>,

    /// 例: "Nop", "RandomDiscard(7)"
    #[arg(short, long)]
    actor: Option<String>,

    /// 牌譜URLの追記先
    #[arg(long)]
    replay_file: Option<String>,

    /// 標準入力の各行をそのままサーバーへ送信
    #[arg(long)]
    console: bool,

    /// 局の状態を毎回出力
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(&self, conf: &mut Config) {
        if let Some(id) = &self.id {
            conf.tenhou_id = id.clone();
        }
        if let Some(room) = self.room {
            conf.room = room;
        }
        if let Some(room) = self.private_room {
            conf.private_room = Some(room);
        }
        if let Some(t) = self.game_type {
            conf.game_type = t;
        }
        if let Some(actor) = &self.actor {
            conf.actor = actor.clone();
        }
        if let Some(path) = &self.replay_file {
            conf.replay_file = Some(path.clone());
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tenhou_client=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let mut conf = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(c) => c,
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };
    cli.apply(&mut conf);
    if let Err(e) = conf.validate() {
        error!("{}", e);
        std::process::exit(1);
    }
    info!(addr = conf.addr().as_str(), id = conf.tenhou_id.as_str(), "config");

    if let Err(e) = TenhouApp::new(conf, cli.console, cli.verbose).run() {
        error!("{}", e);
        std::process::exit(1);
    }
}
