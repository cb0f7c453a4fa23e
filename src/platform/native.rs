//! Native clipboard access (copypasta).

use copypasta::{ClipboardContext, ClipboardProvider};

/// Copy a generated link to the system clipboard.
pub fn copy_to_clipboard(content: &str) -> bool {
    let mut ctx = match ClipboardContext::new() {
        Ok(ctx) => ctx,
        Err(e) => {
            log::warn!("clipboard unavailable: {e}");
            return false;
        }
    };
    match ctx.set_contents(content.to_string()) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("clipboard write failed: {e}");
            false
        }
    }
}
