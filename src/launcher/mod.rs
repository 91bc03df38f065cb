//! Application and website launcher router.
//!
//! Resolution is exact-key lookup, then substring fuzzy match over the
//! same table, then (websites only) a direct-URL or search-query
//! fallback. App launches walk an ordered chain of methods and stop at
//! the first success: direct executable path → PATH lookup → OS run
//! dialog → OS search-menu simulation.
//!
//! The fuzzy match (`target in key || key in target`) can land on
//! unintended substrings ("code" matches both "vscode" and "discord");
//! table order decides, and this is kept as documented behavior.

mod process;
pub mod tables;

pub use process::ProcessHost;

use crate::automation::InputSynth;
use crate::dispatch::DispatchResult;
use crate::error::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tables::{APP_ALIASES, APP_TABLE, WEBSITE_TABLE};
use tracing::{debug, info};

/// Pause between synthesized keystrokes when driving OS menus.
const MENU_PAUSE: Duration = Duration::from_millis(500);
/// Extra wait for search-menu results to populate.
const SEARCH_RESULTS_PAUSE: Duration = Duration::from_millis(1500);

/// Router for open/close commands.
pub struct LauncherRouter {
    host: Arc<dyn ProcessHost>,
    input: Arc<dyn InputSynth>,
}

impl LauncherRouter {
    /// Create a router over the given collaborators.
    pub fn new(host: Arc<dyn ProcessHost>, input: Arc<dyn InputSynth>) -> Self {
        Self { host, input }
    }

    /// Launch an application by spoken name.
    pub async fn open_app(&self, target: &str) -> DispatchResult {
        let name = normalize_app_name(target);

        if let Some(commands) = exact_app(&name) {
            if self.try_launch_chain(&name, commands).await {
                return DispatchResult::ok(format!("Opened {name}"));
            }
            return DispatchResult::fail(format!("Failed to launch {name}"));
        }

        if let Some((key, commands)) = fuzzy_app(&name) {
            if self.try_launch_chain(key, commands).await {
                return DispatchResult::ok(format!("Opened {key}"));
            }
            return DispatchResult::fail(format!("Failed to launch {key}"));
        }

        // Unknown name: try it as a bare command, then the search menu.
        if self.try_path_launch(&name).await || self.try_search_menu(&name).await {
            return DispatchResult::ok(format!("Opened {name}"));
        }
        DispatchResult::fail(format!("Failed to launch {name}"))
    }

    /// Open a website by spoken name, URL, or search phrase.
    pub async fn open_website(&self, target: &str) -> DispatchResult {
        let name = target.to_lowercase();
        let name = name.trim();

        let hit = WEBSITE_TABLE
            .iter()
            .find(|(key, _)| *key == name)
            .or_else(|| {
                WEBSITE_TABLE
                    .iter()
                    .find(|(key, _)| name.contains(key) || key.contains(name))
            })
            .copied();
        if let Some((key, url)) = hit {
            return match self.host.open_url(url).await {
                Ok(()) => DispatchResult::ok(format!("Opened {key}: {url}")),
                Err(e) => DispatchResult::fail(format!("Failed to open {key}: {e}")),
            };
        }

        // Looks like a URL?
        if name.contains('.') || name.starts_with("http") {
            let url = if name.starts_with("http") {
                name.to_owned()
            } else {
                format!("https://{name}")
            };
            if url::Url::parse(&url).is_ok() {
                return match self.host.open_url(&url).await {
                    Ok(()) => DispatchResult::ok(format!("Opened URL: {url}")),
                    Err(e) => DispatchResult::fail(format!("Failed to open {url}: {e}")),
                };
            }
        }

        // Fall back to a web search.
        let query = name
            .split_whitespace()
            .map(|w| urlencoding::encode(w).into_owned())
            .collect::<Vec<_>>()
            .join("+");
        let url = format!("https://google.com/search?q={query}");
        match self.host.open_url(&url).await {
            Ok(()) => DispatchResult::ok(format!("Searched for: {name}")),
            Err(e) => DispatchResult::fail(format!("Search failed: {e}")),
        }
    }

    /// Terminate an application by name, falling back to closing the
    /// focused window.
    pub async fn close_app(&self, target: &str) -> DispatchResult {
        let name = normalize_app_name(target);
        match self.host.terminate_matching(&name).await {
            Ok(true) => return DispatchResult::ok(format!("Closed {name}")),
            Ok(false) => debug!("no process matched '{name}', closing focused window"),
            Err(e) => debug!("terminate failed for '{name}': {e}, closing focused window"),
        }
        match self.input.key_combo(&["alt", "F4"]).await {
            Ok(()) => DispatchResult::ok("Sent close command to current window"),
            Err(e) => DispatchResult::fail(format!("Failed to close {name}: {e}")),
        }
    }

    /// Close the focused window.
    pub async fn close_current(&self) -> DispatchResult {
        match self.input.key_combo(&["alt", "F4"]).await {
            Ok(()) => DispatchResult::ok("Closed current window"),
            Err(e) => DispatchResult::fail(format!("Failed to close window: {e}")),
        }
    }

    /// Close the current browser tab.
    pub async fn close_tab(&self) -> DispatchResult {
        match self.input.key_combo(&["ctrl", "w"]).await {
            Ok(()) => DispatchResult::ok("Closed current tab"),
            Err(e) => DispatchResult::fail(format!("Failed to close tab: {e}")),
        }
    }

    /// Ordered launch chain, stopping at the first method that works.
    async fn try_launch_chain(&self, name: &str, commands: &[&str]) -> bool {
        info!("attempting to launch {name}");

        // Method 1: direct executable paths and PATH-resolved commands.
        for command in commands {
            if self.try_command(command).await {
                return true;
            }
        }

        // Method 2: OS run dialog with the first bare command.
        if let Some(command) = commands.iter().find(|c| !c.contains(std::path::MAIN_SEPARATOR))
            && self.try_run_dialog(command).await
        {
            return true;
        }

        // Method 3: OS search-menu simulation with the spoken name.
        self.try_search_menu(name).await
    }

    /// Launch one candidate: absolute path if it exists, else PATH lookup.
    async fn try_command(&self, command: &str) -> bool {
        let path = Path::new(command);
        if path.is_absolute() && path.exists() {
            return self.spawn_quiet(path).await;
        }
        self.try_path_launch(command).await
    }

    async fn try_path_launch(&self, command: &str) -> bool {
        let Some(resolved) = self.host.resolve(command) else {
            return false;
        };
        self.spawn_quiet(&resolved).await
    }

    async fn spawn_quiet(&self, path: &Path) -> bool {
        match self.host.spawn(path, &[]).await {
            Ok(pid) => {
                info!("launched {} (pid {pid})", path.display());
                true
            }
            Err(e) => {
                debug!("spawn {} failed: {e}", path.display());
                false
            }
        }
    }

    async fn try_run_dialog(&self, command: &str) -> bool {
        let attempt: Result<()> = async {
            self.input.key_combo(&["super", "r"]).await?;
            tokio::time::sleep(MENU_PAUSE).await;
            self.input.type_text(command).await?;
            self.input.press_key("enter").await?;
            Ok(())
        }
        .await;
        match attempt {
            Ok(()) => {
                info!("launched '{command}' via run dialog");
                true
            }
            Err(e) => {
                debug!("run dialog failed: {e}");
                false
            }
        }
    }

    async fn try_search_menu(&self, name: &str) -> bool {
        let attempt: Result<()> = async {
            self.input.press_key("super").await?;
            tokio::time::sleep(MENU_PAUSE).await;
            self.input.type_text(name).await?;
            tokio::time::sleep(SEARCH_RESULTS_PAUSE).await;
            self.input.press_key("enter").await?;
            Ok(())
        }
        .await;
        match attempt {
            Ok(()) => {
                info!("launched '{name}' via search menu");
                true
            }
            Err(e) => {
                debug!("search menu failed: {e}");
                false
            }
        }
    }
}

fn normalize_app_name(target: &str) -> String {
    let name = target.to_lowercase();
    let name = name.trim();
    for (alias, canonical) in APP_ALIASES {
        if name == *alias {
            return (*canonical).to_owned();
        }
    }
    name.to_owned()
}

fn exact_app(name: &str) -> Option<&'static [&'static str]> {
    APP_TABLE
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, commands)| *commands)
}

fn fuzzy_app(name: &str) -> Option<(&'static str, &'static [&'static str])> {
    APP_TABLE
        .iter()
        .find(|(key, _)| name.contains(key) || key.contains(name))
        .map(|(key, commands)| (*key, *commands))
}
