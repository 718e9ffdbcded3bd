#![no_main]

use libfuzzer_sys::fuzz_target;
use yawl::{EventData, Parser, Reader, Scanner};

fuzz_target!(|data: &[u8]| fuzz(data));

fn fuzz(data: &[u8]) {
    let Ok(reader) = Reader::new(data, None) else {
        return;
    };
    let mut parser = Parser::new(Scanner::new(reader));
    while let Ok(event) = parser.parse() {
        if matches!(event.data, EventData::StreamEnd) {
            break;
        }
    }
}
