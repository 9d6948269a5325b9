//! Provider implementation for Bolton Council using its Verint bin collection form.
//!
//! The council offers no API, so the form is driven in headless Chrome and the rendered
//! results page is scanned for dates.

mod form;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::spawn_blocking;

use binday_core::{
    model::{AddressQuery, BinCollection, CouncilId, CouncilMeta},
    plugin::CouncilPlugin,
    ports::{CollectionPort, PortError},
};

pub use form::{AddressChoice, pick_address};

/// Start page of the collection dates request.
pub const FORM_URL: &str =
    "https://bolton.portal.uk.empro.verintcloudservices.com/site/empro-bolton/request/es_bin_collection_dates";

const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
/// Settings for the Chrome session that drives the form.
pub struct BrowserOptions {
    /// Page the session starts on.
    pub url: String,
    /// Run without a visible window.
    pub headless: bool,
    /// Upper bound for each wait on a form element.
    pub timeout: Duration,
    /// Pause after leaving the landing page.
    pub landing_delay: Duration,
    /// Pause after submitting the postcode while the address list loads.
    pub address_delay: Duration,
    /// Browser viewport in pixels.
    pub window_size: (u32, u32),
    /// User agent reported to the council's site.
    pub user_agent: String,
    /// Chrome binary to launch instead of the auto-detected one.
    pub chrome_path: Option<PathBuf>,
    /// Where to save a PNG of the page when a run fails; `None` disables it.
    pub screenshot_path: Option<PathBuf>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            url: FORM_URL.to_owned(),
            headless: true,
            timeout: Duration::from_secs(30),
            landing_delay: Duration::from_secs(1),
            address_delay: Duration::from_secs(3),
            window_size: (1920, 1080),
            user_agent: DESKTOP_USER_AGENT.to_owned(),
            chrome_path: None,
            screenshot_path: Some(PathBuf::from("error_screenshot.png")),
        }
    }
}

/// Collection date lookup for Bolton.
pub struct BoltonCollectionPort {
    options: Arc<BrowserOptions>,
    meta: CouncilMeta,
}

impl BoltonCollectionPort {
    /// Create a new port that launches Chrome with the given options.
    #[must_use]
    pub fn new(options: BrowserOptions) -> Self {
        Self {
            options: Arc::new(options),
            meta: council_meta(),
        }
    }
}

#[async_trait]
impl CollectionPort for BoltonCollectionPort {
    fn council(&self) -> &CouncilMeta {
        &self.meta
    }

    async fn collections(&self, query: &AddressQuery) -> Result<Vec<BinCollection>, PortError> {
        log::info!(
            "Starting Bolton lookup for {} (house {})",
            query.postcode,
            query.house_number
        );

        let options = Arc::clone(&self.options);
        let query = query.clone();

        // headless_chrome blocks on every devtools round trip
        spawn_blocking(move || form::run(&options, &query))
            .await
            .map_err(|err| PortError::Internal(format!("Browser task failed: {err}")))?
    }
}

/// Build the plugin bundle for the Bolton provider.
#[must_use]
pub fn plugin(options: BrowserOptions) -> CouncilPlugin {
    CouncilPlugin {
        meta: council_meta(),
        collection_port: Arc::new(BoltonCollectionPort::new(options)),
    }
}

fn council_meta() -> CouncilMeta {
    CouncilMeta {
        id: CouncilId(String::from("bolton")),
        name: String::from("Bolton Council"),
    }
}
