//! UI events and the table mapping them to dispatcher actions
//!
//! Every control on the search page funnels into one of these events. The
//! dispatcher never inspects an event directly; it looks up the action list in
//! [`EVENT_TABLE`] and applies each action in order.

use crate::interface::{Scope, SearchType};

/// On-screen keyboards for typing non-Latin scripts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyboard {
    Hebrew,
    Greek,
}

/// A key on one of the virtual keyboards
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VirtualKey {
    /// Inserts its text; some keys carry a letter plus combining marks
    Insert(String),
    Backspace,
    Clear,
}

impl VirtualKey {
    /// Apply this key to the current input text
    pub fn apply(&self, text: &str) -> String {
        match self {
            VirtualKey::Insert(chars) => format!("{}{}", text, chars),
            VirtualKey::Backspace => {
                let mut edited = text.to_string();
                edited.pop();
                edited
            }
            VirtualKey::Clear => String::new(),
        }
    }
}

/// Search mode tabs above the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchTab {
    #[default]
    Keyword,
    Reference,
    Hebrew,
    Greek,
}

impl SearchTab {
    pub fn search_type(&self) -> SearchType {
        match self {
            SearchTab::Reference => SearchType::Reference,
            _ => SearchType::Keyword,
        }
    }

    /// Keyboard opened by selecting this tab. Other tabs close any open keyboard.
    pub fn keyboard(&self) -> Option<Keyboard> {
        match self {
            SearchTab::Hebrew => Some(Keyboard::Hebrew),
            SearchTab::Greek => Some(Keyboard::Greek),
            _ => None,
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            SearchTab::Keyword => "Enter search term...",
            SearchTab::Reference => "Enter reference (e.g., John 3:16, Gen 1:1-5)...",
            SearchTab::Hebrew => "Enter Hebrew text...",
            SearchTab::Greek => "Enter Greek text...",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// The input's full text after a keystroke or paste
    Input(String),
    VirtualKey(VirtualKey),
    ScopeSelected(Scope),
    TabSelected(SearchTab),
    KeyboardToggled(Keyboard),
    Focus,
    Escape,
    OutsideClick,
    /// Leaving the page
    Navigate,
}

/// Payload-free discriminant of [`UiEvent`], used as the table key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Input,
    VirtualKey,
    ScopeSelected,
    TabSelected,
    KeyboardToggled,
    Focus,
    Escape,
    OutsideClick,
    Navigate,
}

impl UiEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            UiEvent::Input(_) => EventKind::Input,
            UiEvent::VirtualKey(_) => EventKind::VirtualKey,
            UiEvent::ScopeSelected(_) => EventKind::ScopeSelected,
            UiEvent::TabSelected(_) => EventKind::TabSelected,
            UiEvent::KeyboardToggled(_) => EventKind::KeyboardToggled,
            UiEvent::Focus => EventKind::Focus,
            UiEvent::Escape => EventKind::Escape,
            UiEvent::OutsideClick => EventKind::OutsideClick,
            UiEvent::Navigate => EventKind::Navigate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Replace the input text with the event's text
    SetText,
    /// Edit the input text with the event's virtual key
    EditText,
    SetScope,
    /// Switch search type, placeholder and keyboard
    SetTab,
    ToggleKeyboard,
    CloseKeyboards,
    /// Restyle for the detected script, then clear or (re)start the debounce
    InputChanged,
    Reveal,
    Hide,
    Dispose,
}

pub const EVENT_TABLE: &[(EventKind, &[Action])] = &[
    (EventKind::Input, &[Action::SetText, Action::InputChanged]),
    (EventKind::VirtualKey, &[Action::EditText, Action::InputChanged]),
    (EventKind::ScopeSelected, &[Action::SetScope, Action::InputChanged]),
    (EventKind::TabSelected, &[Action::SetTab, Action::InputChanged]),
    (EventKind::KeyboardToggled, &[Action::ToggleKeyboard]),
    (EventKind::Focus, &[Action::Reveal]),
    (EventKind::Escape, &[Action::Hide, Action::CloseKeyboards]),
    (EventKind::OutsideClick, &[Action::Hide]),
    (EventKind::Navigate, &[Action::Dispose]),
];

pub fn actions_for(kind: EventKind) -> &'static [Action] {
    EVENT_TABLE
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, actions)| *actions)
        .unwrap_or(&[])
}
