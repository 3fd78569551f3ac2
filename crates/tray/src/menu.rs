//! Context menu model for the tray icon.

/// Actions that can be triggered from the tray context menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    /// User requested to quit the application.
    Quit,
}

/// A single menu item.
#[derive(Debug, Clone)]
pub struct MenuItem {
    /// Display text.
    pub label: String,
    /// Whether the item is enabled (clickable).
    pub enabled: bool,
    /// Optional action triggered on click.
    pub action: Option<MenuAction>,
}

impl MenuItem {
    /// Separators are disabled items with no label.
    pub fn is_separator(&self) -> bool {
        self.label.is_empty() && !self.enabled && self.action.is_none()
    }
}

/// Current state used to build the context menu.
#[derive(Debug, Clone)]
pub struct MenuState {
    /// Application display name.
    pub app_name: String,
    /// Latest battery status line, if any reading succeeded.
    pub status: Option<String>,
}

impl Default for MenuState {
    fn default() -> Self {
        Self {
            app_name: "Battery Status".into(),
            status: None,
        }
    }
}

impl MenuState {
    /// Text of the (disabled) header item.
    pub fn header(&self) -> String {
        match &self.status {
            Some(status) => format!("{}: {status}", self.app_name),
            None => format!("{}: waiting for sensor", self.app_name),
        }
    }

    /// Builds the menu items from the current state.
    pub fn build_menu(&self) -> Vec<MenuItem> {
        vec![
            MenuItem {
                label: self.header(),
                enabled: false,
                action: None,
            },
            MenuItem {
                label: String::new(),
                enabled: false,
                action: None,
            },
            MenuItem {
                label: "Quit".into(),
                enabled: true,
                action: Some(MenuAction::Quit),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_menu_state() {
        let state = MenuState::default();
        assert_eq!(state.app_name, "Battery Status");
        assert!(state.status.is_none());
    }

    #[test]
    fn build_menu_before_first_reading() {
        let items = MenuState::default().build_menu();

        // Header, separator, quit.
        assert_eq!(items.len(), 3);
        assert!(items[0].label.contains("waiting for sensor"));
        assert!(!items[0].enabled);
        assert!(items[1].is_separator());
        assert!(items.last().unwrap().action == Some(MenuAction::Quit));
    }

    #[test]
    fn header_shows_status() {
        let state = MenuState {
            status: Some("80% — 11.88V".into()),
            ..MenuState::default()
        };
        assert_eq!(state.header(), "Battery Status: 80% — 11.88V");
    }

    #[test]
    fn quit_is_the_only_action() {
        let items = MenuState::default().build_menu();
        let actions: Vec<_> = items.iter().filter_map(|i| i.action.clone()).collect();
        assert_eq!(actions, vec![MenuAction::Quit]);

        let quit = items.iter().find(|i| i.action == Some(MenuAction::Quit));
        assert!(quit.unwrap().enabled);
    }
}
