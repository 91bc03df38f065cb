//! Static application and website tables.
//!
//! Apps map a spoken name to an ordered list of launch-command
//! candidates (tried in order against the filesystem and PATH). Websites
//! map a spoken name to a canonical URL. Lookup is exact first, then
//! substring-fuzzy in table order.

/// (spoken name, launch-command candidates)
pub const APP_TABLE: &[(&str, &[&str])] = &[
    // Office
    ("word", &["winword.exe", "winword"]),
    ("excel", &["excel.exe", "excel"]),
    ("powerpoint", &["powerpnt.exe", "powerpnt"]),
    ("outlook", &["outlook.exe", "outlook"]),
    ("onenote", &["onenote.exe", "onenote"]),
    ("teams", &["ms-teams.exe", "teams"]),
    // Browsers
    ("chrome", &["google-chrome", "chrome.exe", "chrome", "chromium"]),
    ("firefox", &["firefox", "firefox.exe"]),
    ("edge", &["msedge.exe", "microsoft-edge"]),
    // Development tools
    ("vscode", &["code", "code.exe", "codium"]),
    ("visual studio", &["devenv.exe", "devenv"]),
    ("terminal", &["gnome-terminal", "konsole", "xterm"]),
    // System apps
    ("notepad", &["notepad.exe", "notepad", "gedit", "kate"]),
    ("calculator", &["calc.exe", "gnome-calculator", "kcalc"]),
    ("paint", &["mspaint.exe", "mspaint"]),
    ("file explorer", &["explorer.exe", "nautilus", "dolphin"]),
    ("task manager", &["taskmgr.exe", "gnome-system-monitor"]),
    // Media
    ("spotify", &["spotify", "spotify.exe"]),
    ("vlc", &["vlc", "vlc.exe"]),
    // Communication
    ("discord", &["discord", "Discord.exe"]),
    ("skype", &["skypeforlinux", "skype.exe"]),
    ("zoom", &["zoom", "zoom.exe"]),
    ("slack", &["slack", "slack.exe"]),
];

/// (spoken name, canonical URL)
pub const WEBSITE_TABLE: &[(&str, &str)] = &[
    ("youtube", "https://youtube.com"),
    ("google", "https://google.com"),
    ("facebook", "https://facebook.com"),
    ("twitter", "https://twitter.com"),
    ("instagram", "https://instagram.com"),
    ("linkedin", "https://linkedin.com"),
    ("reddit", "https://reddit.com"),
    ("github", "https://github.com"),
    ("stackoverflow", "https://stackoverflow.com"),
    ("gmail", "https://gmail.com"),
    ("netflix", "https://netflix.com"),
    ("amazon", "https://amazon.com"),
    ("ebay", "https://ebay.com"),
    ("wikipedia", "https://wikipedia.org"),
    ("chatgpt", "https://chat.openai.com"),
    ("claude", "https://claude.ai"),
];

/// Spoken aliases folded onto canonical app-table keys before lookup.
/// "bs code" covers a common speech-recognition mishearing.
pub const APP_ALIASES: &[(&str, &str)] = &[
    ("vs code", "vscode"),
    ("visual studio code", "vscode"),
    ("bs code", "vscode"),
    ("editor", "vscode"),
];
