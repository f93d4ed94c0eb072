//! UI actions. Keys and background tasks produce them; `App::process_action`
//! is the only place they take effect.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    /// Manual poll.
    Refresh,
    ToggleAutoRefresh,
    /// Switch to the next environment in the selector.
    CycleEnvironment,
    ScrollUp,
    ScrollDown,
    ToggleHelp,
    /// Close the notification popup.
    DismissAlert,
    /// Show a blocking notification.
    Alert(String),
    /// Terminal focus changed.
    Visibility(bool),
    RefreshInterval(Duration),
    Tick,
    Render,
}
