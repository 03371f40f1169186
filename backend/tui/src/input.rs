//! Keyboard Input Handler
//!
//! Maps crossterm key events to user intents.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Start the camera, or take the snapshot when it is already live.
    Capture,
    Retake,
    RunInference,
    ScrollUp,
    ScrollDown,
    Quit,
}

/// Handles a single keyboard event.
pub fn handle_key_event(key: KeyEvent) -> Option<Intent> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Intent::Quit),
        KeyCode::Char('q') | KeyCode::Esc => Some(Intent::Quit),
        KeyCode::Char('c') | KeyCode::Char(' ') => Some(Intent::Capture),
        KeyCode::Char('r') => Some(Intent::Retake),
        KeyCode::Char('i') | KeyCode::Enter => Some(Intent::RunInference),
        KeyCode::Up | KeyCode::Char('k') => Some(Intent::ScrollUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Intent::ScrollDown),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_capture_keys() {
        assert_eq!(handle_key_event(key(KeyCode::Char('c'))), Some(Intent::Capture));
        assert_eq!(handle_key_event(key(KeyCode::Char(' '))), Some(Intent::Capture));
    }

    #[test]
    fn test_ctrl_c_quits_instead_of_capturing() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key_event(ctrl_c), Some(Intent::Quit));
        assert_eq!(handle_key_event(key(KeyCode::Esc)), Some(Intent::Quit));
    }

    #[test]
    fn test_inference_and_scroll() {
        assert_eq!(handle_key_event(key(KeyCode::Enter)), Some(Intent::RunInference));
        assert_eq!(handle_key_event(key(KeyCode::Char('i'))), Some(Intent::RunInference));
        assert_eq!(handle_key_event(key(KeyCode::Down)), Some(Intent::ScrollDown));
        assert_eq!(handle_key_event(key(KeyCode::Char('x'))), None);
    }
}
