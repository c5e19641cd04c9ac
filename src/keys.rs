use crate::config::Modifier;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Open the composer with the current selection.
    Capture,
    TogglePanel,
    ClosePanel,
}

/// Modifier state of one keydown event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyMods {
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
}

impl KeyMods {
    fn holds(self, modifier: Modifier) -> bool {
        match modifier {
            Modifier::Alt => self.alt,
            Modifier::Ctrl => self.ctrl,
            Modifier::Meta => self.meta,
        }
    }
}

/// Maps a keydown to a command. `key` is `KeyboardEvent.key`.
pub fn decode(key: &str, mods: KeyMods, modifier: Modifier) -> Option<Command> {
    if key == "Escape" {
        return Some(Command::ClosePanel);
    }
    if !mods.holds(modifier) {
        return None;
    }
    match key.to_lowercase().as_str() {
        "s" => Some(Command::Capture),
        "n" => Some(Command::TogglePanel),
        _ => None,
    }
}
