use rand::Rng;

use crate::identifiers::{ROOM_CODE_LENGTH, RoomCode};

const ROOM_CODE_ALPHABET: &[u8] = b"0123456789";

pub fn generate_room_code() -> RoomCode {
    let mut rng = rand::rng();
    let code: String = (0..ROOM_CODE_LENGTH)
        .map(|_| ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect();
    RoomCode::parse(&code).expect("Generated room code has the required length")
}
