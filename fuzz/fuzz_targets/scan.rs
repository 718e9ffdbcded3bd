#![no_main]

use libfuzzer_sys::fuzz_target;
use yawl::{Reader, Scanner, TokenData};

fuzz_target!(|data: &[u8]| fuzz(data));

fn fuzz(data: &[u8]) {
    let Ok(reader) = Reader::new(data, None) else {
        return;
    };
    let mut scanner = Scanner::new(reader);
    while let Ok(token) = scanner.pop() {
        if matches!(token.data, TokenData::StreamEnd) {
            break;
        }
    }
}
