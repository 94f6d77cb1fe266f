use std::fmt;

use crate::model::*;

// 送信するタグの文字列表現
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Command::*;
        match self {
            Helo { name } => write!(f, r#"<HELO name="{}" tid="f0" sx="M" />"#, name),
            Join { room, game_type } => write!(f, r#"<JOIN t="{},{}" />"#, room, game_type),
            EnterPrivateRoom { room } => write!(f, r#"<CHAT text="%2Flobby%20{}" />"#, room),
            NextReady => write!(f, "<NEXTREADY />"),
            Bye => write!(f, "<BYE />"),
            Pass => write!(f, "<N />"),
            Discard(t) => write!(f, r#"<D p="{}" />"#, t),
            Pon(t0, t1) => write!(f, r#"<N type="1" hai0="{}" hai1="{}" />"#, t0, t1),
            Minkan => write!(f, r#"<N type="2" />"#),
            Chii(t0, t1) => write!(f, r#"<N type="3" hai0="{}" hai1="{}" />"#, t0, t1),
            Ankan(t) => write!(f, r#"<N type="4" hai="{}" />"#, t / 4 * 4 + 2),
            Kakan(t) => write!(f, r#"<N type="5" hai="{}" />"#, t),
            Ron => write!(f, r#"<N type="6" />"#),
            Tsumo => write!(f, r#"<N type="7" />"#),
            Ryuukyoku => write!(f, r#"<N type="9" />"#),
            Nuku => write!(f, r#"<N type="10" />"#),
            Reach(t) => write!(f, r#"<REACH hai="{}" />"#, t),
            Heartbeat => write!(f, "<Z />"),
            Auth(val) => write!(f, r#"<AUTH val="{}"/>"#, val),
            GoOk => write!(f, "<GOK />"),
            Raw(s) => write!(f, "{}", s),
        }
    }
}

#[test]
fn test_command_format() {
    assert_eq!(
        Command::Helo {
            name: "NoName".to_string()
        }
        .to_string(),
        r#"<HELO name="NoName" tid="f0" sx="M" />"#
    );
    assert_eq!(
        Command::Join {
            room: 0,
            game_type: 9
        }
        .to_string(),
        r#"<JOIN t="0,9" />"#
    );
    assert_eq!(
        Command::EnterPrivateRoom { room: 1234 }.to_string(),
        r#"<CHAT text="%2Flobby%201234" />"#
    );
    assert_eq!(Command::Discard(53).to_string(), r#"<D p="53" />"#);
    assert_eq!(
        Command::Pon(89, 90).to_string(),
        r#"<N type="1" hai0="89" hai1="90" />"#
    );
    // 暗槓は種別の3枚目を指定
    assert_eq!(Command::Ankan(109).to_string(), r#"<N type="4" hai="110" />"#);
    assert_eq!(Command::Nuku.to_string(), r#"<N type="10" />"#);
    assert_eq!(Command::Pass.to_string(), "<N />");
    assert_eq!(Command::Reach(12).to_string(), r#"<REACH hai="12" />"#);
}
