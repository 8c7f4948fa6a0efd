use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    Quit,
    MoveUp,
    MoveDown,
    SwitchPane,
    Select,
    OpenInBrowser,
    Reload,
    ClearSearch,
    ShowHelp,
    HideHelp,
    StartSearch,
    StartAddUrl,
    // Text input actions
    InputChar(char),
    InputBackspace,
    InputConfirm,
    InputCancel,
}

/// Which popup, if any, is capturing keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Search,
    Url,
}

pub fn handle_key_event(key: KeyEvent, input_mode: InputMode, show_help: bool) -> Option<AppAction> {
    // If help is showing, any key closes it
    if show_help {
        return Some(AppAction::HideHelp);
    }

    if input_mode != InputMode::Normal {
        return match key.code {
            KeyCode::Enter => Some(AppAction::InputConfirm),
            KeyCode::Esc => Some(AppAction::InputCancel),
            KeyCode::Backspace => Some(AppAction::InputBackspace),
            KeyCode::Char(c) => Some(AppAction::InputChar(c)),
            _ => None,
        };
    }

    // Normal mode
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), _) => Some(AppAction::Quit),
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(AppAction::Quit),

        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => Some(AppAction::MoveDown),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => Some(AppAction::MoveUp),
        (KeyCode::Tab, _) => Some(AppAction::SwitchPane),
        (KeyCode::Enter, _) => Some(AppAction::Select),

        (KeyCode::Char('/'), _) => Some(AppAction::StartSearch),
        (KeyCode::Esc, _) => Some(AppAction::ClearSearch),
        (KeyCode::Char('a'), _) => Some(AppAction::StartAddUrl),
        (KeyCode::Char('o'), _) => Some(AppAction::OpenInBrowser),
        (KeyCode::Char('r'), _) => Some(AppAction::Reload),

        (KeyCode::Char('?'), _) => Some(AppAction::ShowHelp),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn input_mode_captures_characters() {
        assert_eq!(
            handle_key_event(press(KeyCode::Char('q')), InputMode::Search, false),
            Some(AppAction::InputChar('q'))
        );
        assert_eq!(
            handle_key_event(press(KeyCode::Esc), InputMode::Url, false),
            Some(AppAction::InputCancel)
        );
    }

    #[test]
    fn normal_mode_maps_commands() {
        assert_eq!(
            handle_key_event(press(KeyCode::Char('q')), InputMode::Normal, false),
            Some(AppAction::Quit)
        );
        assert_eq!(
            handle_key_event(press(KeyCode::Char('/')), InputMode::Normal, false),
            Some(AppAction::StartSearch)
        );
    }

    #[test]
    fn help_swallows_any_key() {
        assert_eq!(
            handle_key_event(press(KeyCode::Char('q')), InputMode::Normal, true),
            Some(AppAction::HideHelp)
        );
    }
}
