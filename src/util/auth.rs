// HELOのauth属性に対する応答値の計算
use crate::error::{Error, Res};

const AUTH_TABLE: [u16; 26] = [
    63006, 9570, 49216, 45888, 9822, 23121, 59830, 51114, 54831, 4189, 580, 5203, 42174, 59972,
    55457, 59009, 59347, 64456, 8673, 52710, 49975, 2006, 62677, 3463, 17754, 5357,
];

// "20180117-e7b2ad8a" -> "20180117-c1ecf7db"
pub fn auth_response(challenge: &str) -> Res<String> {
    let bad = || Error::AuthChallenge(challenge.to_string());

    let (a, b) = challenge.split_once('-').ok_or_else(bad)?;
    if a.len() < 8 || !a.is_ascii() || b.len() != 8 || !b.is_ascii() {
        return Err(bad());
    }

    let seed: u32 = format!("2{}", &a[2..8]).parse().map_err(|_| bad())?;
    let digit = a[7..8].parse::<u32>().map_err(|_| bad())?;
    // digitは0~9なので除数は3~12
    let index = (seed % (13 - digit - 1)) as usize;

    let hi = u16::from_str_radix(&b[..4], 16).map_err(|_| bad())?;
    let lo = u16::from_str_radix(&b[4..], 16).map_err(|_| bad())?;

    Ok(format!(
        "{}-{:04x}{:04x}",
        a,
        AUTH_TABLE[index * 2] ^ hi,
        AUTH_TABLE[index * 2 + 1] ^ lo
    ))
}

#[test]
fn test_auth_response() {
    assert_eq!(auth_response("20180117-e7b2ad8a").unwrap(), "20180117-c1ecf7db");
}

#[test]
fn test_auth_response_malformed() {
    assert!(auth_response("20180117e7b2ad8a").is_err());
    assert!(auth_response("2018-e7b2ad8a").is_err());
    assert!(auth_response("20180117-e7b2").is_err());
    assert!(auth_response("20180117-zzzzzzzz").is_err());
    assert!(auth_response("2018011x-e7b2ad8a").is_err());
}
