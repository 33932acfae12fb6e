pub mod config;
pub mod layout;
pub mod shared;

use wasm_bindgen::prelude::wasm_bindgen;

/// Browser logging: `log` records go to the devtools console, panics too.
pub fn init_logging() {
    // initializes logging using the `log` crate
    _ = console_log::init_with_level(log::Level::Debug);
    console_error_panic_hook::set_once();
}

#[wasm_bindgen(start)]
pub fn start() {
    init_logging();
}
