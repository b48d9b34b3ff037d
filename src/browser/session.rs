use crate::{browser::config::{ConnectionOptions, LaunchOptions},
            dom::DomTree,
            error::{LabelerError, Result}};
use headless_chrome::{Browser, Tab};
use serde::de::DeserializeOwned;
use std::{ffi::OsStr, sync::Arc, time::Duration};

/// Browser session bound to the tab being labeled
pub struct BrowserSession {
    /// The underlying headless_chrome Browser instance
    browser: Browser,

    /// Tab the labeling bridge is installed in
    tab: Arc<Tab>,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Ignore default arguments to prevent detection by anti-bot services
        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));

        // A labeling session sits idle while the user reads the page
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));

        if let Some(path) = options.chrome_path {
            launch_opts.path = Some(path);
        }

        if let Some(dir) = options.user_data_dir {
            launch_opts.user_data_dir = Some(dir);
        }

        launch_opts.sandbox = options.sandbox;

        let browser = Browser::new(launch_opts).map_err(|e| LabelerError::LaunchFailed(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| LabelerError::LaunchFailed(format!("Failed to create tab: {}", e)))?;

        log::info!("Launched {} browser", if options.headless { "headless" } else { "headed" });
        Ok(Self { browser, tab })
    }

    /// Connect to an existing browser instance via WebSocket and take over its first tab
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let browser = Browser::connect_with_timeout(options.ws_url.clone(), Duration::from_millis(options.timeout))
            .map_err(|e| LabelerError::ConnectionFailed(e.to_string()))?;

        let existing = browser
            .get_tabs()
            .lock()
            .map_err(|e| LabelerError::TabOperationFailed(format!("Failed to get tabs: {}", e)))?
            .first()
            .cloned();

        let tab = match existing {
            Some(tab) => tab,
            None => browser
                .new_tab()
                .map_err(|e| LabelerError::TabOperationFailed(format!("Failed to create tab: {}", e)))?,
        };

        log::info!("Connected to browser at {}", options.ws_url);
        Ok(Self { browser, tab })
    }

    /// Get the labeled tab
    pub fn tab(&self) -> Arc<Tab> {
        Arc::clone(&self.tab)
    }

    /// Get the underlying Browser instance
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Navigate the labeled tab to a URL
    pub fn navigate(&self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| LabelerError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e)))?;

        Ok(())
    }

    /// Wait for navigation to complete
    pub fn wait_for_navigation(&self) -> Result<()> {
        self.tab
            .wait_until_navigated()
            .map_err(|e| LabelerError::NavigationFailed(format!("Navigation timeout: {}", e)))?;

        Ok(())
    }

    /// Evaluate a script in the page and return its value, if any
    pub fn evaluate(&self, script: &str) -> Result<Option<serde_json::Value>> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| LabelerError::EvaluationFailed(e.to_string()))?;

        Ok(result.value)
    }

    /// Evaluate a script that returns a JSON string and deserialize it
    pub fn evaluate_json<T: DeserializeOwned>(&self, script: &str) -> Result<T> {
        decode_json_result(self.evaluate(script)?)
    }

    /// Extract the DOM tree from the labeled tab
    pub fn extract_dom(&self) -> Result<DomTree> {
        DomTree::from_tab(&self.tab)
    }

    /// Close the labeled tab; the browser exits when the session is dropped
    pub fn close(&self) -> Result<()> {
        self.tab
            .close(false)
            .map_err(|e| LabelerError::TabOperationFailed(format!("Failed to close tab: {}", e)))?;
        Ok(())
    }
}

/// Decode the value of a script that returns a JSON string
pub(crate) fn decode_json_result<T: DeserializeOwned>(value: Option<serde_json::Value>) -> Result<T> {
    let value = value.ok_or_else(|| LabelerError::EvaluationFailed("Script returned no value".to_string()))?;

    let json: String = serde_json::from_value(value)
        .map_err(|e| LabelerError::EvaluationFailed(format!("Script did not return a string: {}", e)))?;

    serde_json::from_str(&json)
        .map_err(|e| LabelerError::EvaluationFailed(format!("Failed to parse script result: {}", e)))
}
