#![no_main]

use libfuzzer_sys::fuzz_target;
use yawl::Loader;

fuzz_target!(|data: &[u8]| fuzz(data));

fn fuzz(data: &[u8]) {
    let Ok(loader) = Loader::from_bytes(data) else {
        return;
    };
    for document in loader {
        if document.is_err() {
            break;
        }
    }
}
