pub mod classify;
pub mod config;
pub mod dom;
pub mod engine;
pub mod error;
pub mod gesture;
pub mod markup;
pub mod spans;
pub mod style;
pub mod zoom;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::EngineError;
pub use markup::{fingerprint, has_formatting, rewrite};

use std::cell::RefCell;
use wasm_bindgen::prelude::*;

thread_local! {
    static ENGINE: RefCell<Option<Engine>> = const { RefCell::new(None) };
}

fn init_logging() {
    console_error_panic_hook::set_once();

    #[cfg(target_arch = "wasm32")]
    {
        static INIT: std::sync::Once = std::sync::Once::new();
        INIT.call_once(|| {
            let level = if cfg!(debug_assertions) {
                tracing::Level::DEBUG
            } else {
                tracing::Level::INFO
            };
            tracing_wasm::set_as_global_default_with_config(
                tracing_wasm::WASMLayerConfigBuilder::new()
                    .set_max_level(level)
                    .build(),
            );
        });
    }
}

/// Starts observing the document. Calling it again replaces the running engine.
#[wasm_bindgen]
pub fn start(config: JsValue) -> Result<(), JsValue> {
    init_logging();
    let config = EngineConfig::from_js(config)?;
    stop();
    let engine = Engine::start(config)?;
    ENGINE.with(|slot| *slot.borrow_mut() = Some(engine));
    tracing::info!("bracketless started");
    Ok(())
}

/// Detaches from the document and removes everything the engine added to it.
#[wasm_bindgen]
pub fn stop() {
    let running = ENGINE.with(|slot| slot.borrow_mut().take());
    if let Some(engine) = running {
        engine.stop();
        tracing::info!("bracketless stopped");
    }
}
