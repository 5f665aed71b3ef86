use std::{collections::HashMap,
          path::{Path, PathBuf},
          time::Duration};

/// Chrome binaries probed, in order, when no explicit path is configured.
/// System installs of a container image come before the bundled Lambda binary.
pub const SYSTEM_CHROME_PATHS: &[&str] =
    &["/usr/bin/chromium", "/usr/bin/google-chrome", "/var/task/headless-chromium"];

/// Immutable browser provisioning configuration.
///
/// Built once before launch and handed to the provider. Environment variables
/// for the browser runtime are passed to the child process only; the current
/// process environment is never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Run without a visible window
    pub headless: bool,

    /// Keep Chrome's sandbox enabled
    pub sandbox: bool,

    pub window_width: u32,
    pub window_height: u32,

    /// Chrome binary; when `None` the system paths are probed, then headless_chrome's own lookup
    pub chrome_path: Option<PathBuf>,

    /// Writable root holding profile, data and cache directories
    pub writable_root: PathBuf,

    /// Upper bound for a single page load
    pub page_load_timeout: Duration,

    /// How long the browser may sit idle before headless_chrome drops the connection
    pub idle_timeout: Duration,

    /// Extra command-line switches
    pub extra_args: Vec<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: false,
            window_width: 1280,
            window_height: 1024,
            chrome_path: None,
            writable_root: PathBuf::from("/tmp"),
            page_load_timeout: Duration::from_secs(60),
            idle_timeout: Duration::from_secs(10 * 60),
            extra_args: Vec::new(),
        }
    }
}

impl LaunchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set headless mode
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Builder method: set sandbox mode
    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    /// Builder method: set window size
    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    /// Builder method: set Chrome binary path
    pub fn chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }

    /// Builder method: set writable root directory
    pub fn writable_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.writable_root = root.into();
        self
    }

    /// Builder method: set page load timeout
    pub fn page_load_timeout(mut self, timeout: Duration) -> Self {
        self.page_load_timeout = timeout;
        self
    }

    /// Builder method: append a command-line switch
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    pub fn user_data_dir(&self) -> PathBuf {
        self.writable_root.join("chrome-user-data")
    }

    pub fn data_path(&self) -> PathBuf {
        self.writable_root.join("data-path")
    }

    pub fn disk_cache_dir(&self) -> PathBuf {
        self.writable_root.join("cache-path")
    }

    /// Directories that must exist and be writable before launch
    pub fn writable_dirs(&self) -> Vec<PathBuf> {
        vec![self.user_data_dir(), self.data_path(), self.disk_cache_dir()]
    }

    /// Command-line switches passed to Chrome in addition to headless_chrome's own
    pub fn chrome_args(&self) -> Vec<String> {
        let mut args = vec![
            "--disable-dev-shm-usage".to_string(),
            "--single-process".to_string(),
            format!("--data-path={}", self.data_path().display()),
            format!("--disk-cache-dir={}", self.disk_cache_dir().display()),
        ];
        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Environment of the browser process
    pub fn process_env(&self) -> HashMap<String, String> {
        let root = self.writable_root.display().to_string();
        ["HOME", "XDG_RUNTIME_DIR", "XDG_CACHE_HOME"]
            .into_iter()
            .map(|key| (key.to_string(), root.clone()))
            .collect()
    }

    /// Explicit path, else the first system path that exists
    pub fn resolve_chrome_path(&self) -> Option<PathBuf> {
        self.chrome_path.clone().or_else(|| first_existing(SYSTEM_CHROME_PATHS.iter().map(Path::new)))
    }
}

fn first_existing<'a>(candidates: impl IntoIterator<Item = &'a Path>) -> Option<PathBuf> {
    candidates.into_iter().find(|p| p.exists()).map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_options_defaults() {
        let opts = LaunchOptions::default();

        assert!(opts.headless);
        assert!(!opts.sandbox);
        assert_eq!((opts.window_width, opts.window_height), (1280, 1024));
        assert_eq!(opts.page_load_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_launch_options_builder() {
        let opts = LaunchOptions::new().headless(false).window_size(800, 600).arg("--lang=en-US");

        assert!(!opts.headless);
        assert_eq!(opts.window_width, 800);
        assert_eq!(opts.window_height, 600);
        assert!(opts.chrome_args().contains(&"--lang=en-US".to_string()));
    }

    #[test]
    fn test_writable_dirs_under_root() {
        let opts = LaunchOptions::new().writable_root("/scratch");
        let dirs = opts.writable_dirs();

        assert_eq!(dirs.len(), 3);
        assert!(dirs.iter().all(|d| d.starts_with("/scratch")));
        assert!(opts.chrome_args().contains(&"--disk-cache-dir=/scratch/cache-path".to_string()));
    }

    #[test]
    fn test_process_env_points_at_root() {
        let env = LaunchOptions::new().writable_root("/scratch").process_env();

        assert_eq!(env.get("HOME").map(String::as_str), Some("/scratch"));
        assert_eq!(env.get("XDG_CACHE_HOME").map(String::as_str), Some("/scratch"));
        assert_eq!(env.len(), 3);
    }

    #[test]
    fn test_system_paths_prefer_container_installs() {
        assert_eq!(SYSTEM_CHROME_PATHS, &["/usr/bin/chromium", "/usr/bin/google-chrome", "/var/task/headless-chromium"]);
    }

    #[test]
    fn test_first_existing_path_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let chromium = dir.path().join("chromium");
        let bundled = dir.path().join("headless-chromium");
        std::fs::write(&chromium, "").unwrap();
        std::fs::write(&bundled, "").unwrap();
        let missing = dir.path().join("google-chrome");

        let candidates = [chromium.as_path(), missing.as_path(), bundled.as_path()];
        assert_eq!(first_existing(candidates), Some(chromium.clone()));

        let candidates = [missing.as_path(), bundled.as_path()];
        assert_eq!(first_existing(candidates), Some(bundled));
    }

    #[test]
    fn test_explicit_chrome_path_wins() {
        let opts = LaunchOptions::new().chrome_path("/opt/chrome/chrome");
        assert_eq!(opts.resolve_chrome_path(), Some(PathBuf::from("/opt/chrome/chrome")));
    }
}
