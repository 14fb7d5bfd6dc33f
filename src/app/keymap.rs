//! Keybinding configuration: parse `keybinds.conf`, provide defaults, and map keys to actions.
//!
//! Bindings map a `(KeyModifiers, KeyCode)` pair to a [`KeyAction`]. Several
//! keys may trigger the same action (e.g. `j` and Down). A config file only
//! overrides or adds bindings on top of the defaults.

use std::collections::HashMap;
use std::path::Path;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Semantic keyboard actions in the normal (non-modal) mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// Exit the application.
    Quit,
    /// Reload the user list from the server.
    Refresh,
    /// Open the new-user form.
    NewUser,
    /// Edit the selected user.
    EditSelection,
    /// Delete the selected user (after confirmation).
    DeleteSelection,
    /// Open the Edit/Delete menu for the selected row.
    EnterAction,
    /// Start search mode.
    StartSearch,
    /// Show help and bindings.
    OpenHelp,
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    /// Bound keys that should do nothing.
    Ignore,
}

const ALL_ACTIONS: [KeyAction; 13] = [
    KeyAction::Quit,
    KeyAction::Refresh,
    KeyAction::NewUser,
    KeyAction::EditSelection,
    KeyAction::DeleteSelection,
    KeyAction::EnterAction,
    KeyAction::StartSearch,
    KeyAction::OpenHelp,
    KeyAction::MoveUp,
    KeyAction::MoveDown,
    KeyAction::PageUp,
    KeyAction::PageDown,
    KeyAction::Ignore,
];

#[derive(Clone, Debug)]
pub struct Keymap {
    bindings: HashMap<(KeyModifiers, KeyCode), KeyAction>,
}

impl Keymap {
    /// Default bindings: arrows plus vim keys for movement, single letters for commands.
    pub fn new_defaults() -> Self {
        use KeyCode::*;
        use KeyModifiers as M;
        let mut bindings = HashMap::new();
        bindings.insert((M::NONE, Char('q')), KeyAction::Quit);
        bindings.insert((M::CONTROL, Char('c')), KeyAction::Quit);
        bindings.insert((M::NONE, Esc), KeyAction::Ignore);
        bindings.insert((M::NONE, Char('r')), KeyAction::Refresh);
        bindings.insert((M::NONE, F(5)), KeyAction::Refresh);
        bindings.insert((M::NONE, Char('n')), KeyAction::NewUser);
        bindings.insert((M::NONE, Char('e')), KeyAction::EditSelection);
        bindings.insert((M::NONE, Char('d')), KeyAction::DeleteSelection);
        bindings.insert((M::NONE, Delete), KeyAction::DeleteSelection);
        bindings.insert((M::NONE, Enter), KeyAction::EnterAction);
        bindings.insert((M::NONE, Char('/')), KeyAction::StartSearch);
        bindings.insert((M::NONE, Char('?')), KeyAction::OpenHelp);

        bindings.insert((M::NONE, Up), KeyAction::MoveUp);
        bindings.insert((M::NONE, Down), KeyAction::MoveDown);
        bindings.insert((M::NONE, Char('k')), KeyAction::MoveUp);
        bindings.insert((M::NONE, Char('j')), KeyAction::MoveDown);
        bindings.insert((M::NONE, PageUp), KeyAction::PageUp);
        bindings.insert((M::NONE, PageDown), KeyAction::PageDown);
        bindings.insert((M::NONE, Left), KeyAction::PageUp);
        bindings.insert((M::NONE, Right), KeyAction::PageDown);
        bindings.insert((M::NONE, Char('h')), KeyAction::PageUp);
        bindings.insert((M::NONE, Char('l')), KeyAction::PageDown);
        Self { bindings }
    }

    /// Load bindings from `path`, writing the defaults there if the file is missing.
    pub fn load_or_init(path: &Path) -> Self {
        if path.exists() {
            return Self::from_file(path).unwrap_or_default();
        }
        let km = Self::default();
        if let Err(e) = km.write_file(path) {
            tracing::warn!(path = %path.display(), error = %e, "could not write default keybindings");
        }
        km
    }

    pub fn from_file(path: &Path) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    /// Apply `Action = KeySpec` lines on top of the defaults.
    ///
    /// `KeySpec = Action` is accepted as well. Lines that parse neither way are ignored.
    pub fn parse(contents: &str) -> Self {
        let mut map = Self::default();
        for line in contents.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((lhs, rhs)) = line.split_once('=') else {
                continue;
            };
            let (lhs, rhs) = (lhs.trim(), rhs.trim());
            if let (Some(action), Some(key)) = (parse_action(lhs), parse_key(rhs)) {
                map.bindings.insert(key, action);
            } else if let (Some(key), Some(action)) = (parse_key(lhs), parse_action(rhs)) {
                map.bindings.insert(key, action);
            }
        }
        map
    }

    pub fn write_file(&self, path: &Path) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# usrapi-manager keybindings\n");
        buf.push_str("# Format: <Action> = <KeySpec>\n");
        buf.push_str("# KeySpec examples: q, Ctrl+c, Enter, Esc, Up, Down, Left, Right, PageUp, PageDown, Delete, F5, /\n");
        let names: Vec<&str> = ALL_ACTIONS.iter().map(|a| format_action(*a)).collect();
        let _ = writeln!(&mut buf, "# Actions: {}\n", names.join(", "));

        for action in ALL_ACTIONS {
            for key in self.keys_for(action) {
                let _ = writeln!(&mut buf, "{} = {}", format_action(action), key);
            }
        }
        std::fs::write(path, buf)
    }

    pub fn resolve(&self, key: &KeyEvent) -> Option<KeyAction> {
        // Shifted characters arrive with SHIFT set; the char already encodes it.
        let mods = match key.code {
            KeyCode::Char(_) => key.modifiers.difference(KeyModifiers::SHIFT),
            _ => key.modifiers,
        };
        self.bindings.get(&(mods, key.code)).copied()
    }

    /// Display specs of every key bound to `action`, sorted.
    pub fn keys_for(&self, action: KeyAction) -> Vec<String> {
        let mut keys: Vec<String> = self
            .bindings
            .iter()
            .filter(|(_, a)| **a == action)
            .map(|((m, c), _)| Self::format_key(*m, *c))
            .collect();
        keys.sort();
        keys
    }

    /// Human-readable key spec such as "Ctrl+c" or "PageDown".
    pub fn format_key(mods: KeyModifiers, code: KeyCode) -> String {
        use KeyCode::*;
        let base = match code {
            Enter => "Enter".to_string(),
            Delete => "Delete".to_string(),
            Esc => "Esc".to_string(),
            Tab => "Tab".to_string(),
            Up => "Up".to_string(),
            Down => "Down".to_string(),
            Left => "Left".to_string(),
            Right => "Right".to_string(),
            PageUp => "PageUp".to_string(),
            PageDown => "PageDown".to_string(),
            F(n) => format!("F{n}"),
            Char(c) => c.to_string(),
            _ => format!("{:?}", code),
        };
        if mods.contains(KeyModifiers::CONTROL) {
            format!("Ctrl+{}", base)
        } else {
            base
        }
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new_defaults()
    }
}

fn parse_key(spec: &str) -> Option<(KeyModifiers, KeyCode)> {
    use KeyCode::*;
    let (mods, rest) = match spec.trim().strip_prefix("Ctrl+") {
        Some(after) => (KeyModifiers::CONTROL, after),
        None => (KeyModifiers::NONE, spec.trim()),
    };
    let code = match rest {
        "Enter" => Enter,
        "Delete" => Delete,
        "Esc" | "Escape" => Esc,
        "Tab" => Tab,
        "Up" => Up,
        "Down" => Down,
        "Left" => Left,
        "Right" => Right,
        "PageUp" => PageUp,
        "PageDown" => PageDown,
        _ => {
            if let Some(n) = rest.strip_prefix('F').and_then(|n| n.parse::<u8>().ok()) {
                F(n)
            } else {
                let mut chars = rest.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Char(c),
                    _ => return None,
                }
            }
        }
    };
    Some((mods, code))
}

fn parse_action(s: &str) -> Option<KeyAction> {
    ALL_ACTIONS
        .iter()
        .copied()
        .find(|a| format_action(*a) == s.trim())
}

pub fn format_action(a: KeyAction) -> &'static str {
    match a {
        KeyAction::Quit => "Quit",
        KeyAction::Refresh => "Refresh",
        KeyAction::NewUser => "NewUser",
        KeyAction::EditSelection => "EditSelection",
        KeyAction::DeleteSelection => "DeleteSelection",
        KeyAction::EnterAction => "EnterAction",
        KeyAction::StartSearch => "StartSearch",
        KeyAction::OpenHelp => "OpenHelp",
        KeyAction::MoveUp => "MoveUp",
        KeyAction::MoveDown => "MoveDown",
        KeyAction::PageUp => "PageUp",
        KeyAction::PageDown => "PageDown",
        KeyAction::Ignore => "Ignore",
    }
}
