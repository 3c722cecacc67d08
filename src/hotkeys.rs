//! Global hotkey management
//!
//! Registers the process-wide screen-check shortcut. The hotkey works even
//! when the app is in the background; the registration lives for the
//! process lifetime.

use global_hotkey::{
    hotkey::{Code, HotKey, Modifiers},
    GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// The screen-check shortcut: Control + Shift + S.
fn screen_check_hotkey() -> HotKey {
    HotKey::new(Some(Modifiers::CONTROL | Modifiers::SHIFT), Code::KeyS)
}

/// Register the global screen-check hotkey.
///
/// The returned manager must be kept alive for as long as the binding
/// should exist; dropping it unregisters the hotkey.
pub fn init_hotkeys() -> Result<GlobalHotKeyManager, String> {
    let manager = GlobalHotKeyManager::new()
        .map_err(|e| format!("Failed to create hotkey manager: {}", e))?;

    manager
        .register(screen_check_hotkey())
        .map_err(|e| format!("Failed to register screen-check hotkey: {}", e))?;

    info!("Registered global hotkey: Control + Shift + S (screen check)");

    Ok(manager)
}

/// Start listening for hotkey events.
///
/// Spawns a dedicated thread (not a tokio task) that polls for hotkey
/// events and invokes the callback on each press. The callback is expected
/// to hand real work off to the runtime immediately.
pub fn start_hotkey_listener(on_screen_check: Arc<dyn Fn() + Send + Sync>) {
    let screen_check_id = screen_check_hotkey().id();

    std::thread::spawn(move || {
        let receiver = GlobalHotKeyEvent::receiver();

        info!("Hotkey listener started on dedicated thread");

        loop {
            // Use try_recv with sleep to avoid blocking issues
            match receiver.try_recv() {
                Ok(event) => {
                    // Only handle key press, ignore key release
                    if event.state != HotKeyState::Pressed {
                        continue;
                    }
                    if event.id == screen_check_id {
                        info!("Hotkey event received: screen check");
                        (on_screen_check)();
                    }
                }
                Err(_) => {
                    // No event, sleep briefly to avoid busy-waiting
                    std::thread::sleep(Duration::from_millis(50));
                }
            }
        }
    });
}
