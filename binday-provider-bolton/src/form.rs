//! Step-by-step automation of the Bolton collection dates form.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;
use std::thread::sleep;

use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use serde_json::{Value, json};

use binday_core::extract::extract_collections;
use binday_core::model::{AddressQuery, BinCollection};
use binday_core::ports::PortError;

use crate::BrowserOptions;

const LANDING_BUTTON: &str = "button.next";
const COOKIE_ACCEPT_XPATH: &str = "//button[contains(., 'Accept') or contains(@id, 'accept')]";
const POSTCODE_INPUT_XPATH: &str =
    "//input[contains(@aria-label, 'Postcode') or contains(@name, 'Postcode')]";
const FIND_ADDRESS_XPATH: &str =
    "//button[contains(text(), 'Find Address') or contains(@class, 'next')]";
const ADDRESS_SELECT: &str = "select";
const NEXT_XPATH: &str = "//button[contains(@class, 'next') or contains(text(), 'Next')]";
const RESULTS_MARKER: &str = ".field-content";
const RESULTS_CONTAINER: &str = "form";

const READ_OPTIONS_JS: &str =
    "function() { return JSON.stringify(Array.from(this.options, (option) => option.text)); }";
const SELECT_INDEX_JS: &str = "function(index) {
    this.selectedIndex = index;
    this.dispatchEvent(new Event('input', { bubbles: true }));
    this.dispatchEvent(new Event('change', { bubbles: true }));
}";
const CLEAR_INPUT_JS: &str = "function() { this.value = ''; }";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Entry chosen from the form's address drop-down.
pub struct AddressChoice {
    /// Position of the entry in the drop-down, placeholder included.
    pub index: usize,
    /// Visible text of the entry.
    pub label: String,
    /// Whether the entry actually mentions the requested house number.
    pub matched: bool,
}

/// Choose the drop-down entry for `house_number`.
///
/// An entry starting with the house number wins over one that merely contains it. With no
/// match at all the first entry after the placeholder is used. Returns `None` when the list
/// holds nothing but the placeholder.
#[must_use]
pub fn pick_address(options: &[String], house_number: &str) -> Option<AddressChoice> {
    let wanted = house_number.trim();

    let leading = options.iter().position(|label| {
        label
            .split_whitespace()
            .next()
            .map(|token| token.trim_end_matches(','))
            .is_some_and(|token| token.eq_ignore_ascii_case(wanted))
    });
    let matched = leading.or_else(|| options.iter().position(|label| label.contains(wanted)));

    let (index, is_match) = match matched {
        Some(index) => (index, true),
        None if options.len() > 1 => (1, false),
        None => return None,
    };

    options.get(index).map(|label| AddressChoice {
        index,
        label: label.clone(),
        matched: is_match,
    })
}

/// Launch Chrome, walk the form and scan the results page.
pub(crate) fn run(
    options: &BrowserOptions,
    query: &AddressQuery,
) -> Result<Vec<BinCollection>, PortError> {
    let browser = launch(options)?;
    let tab = browser
        .new_tab()
        .map_err(|err| PortError::Browser(err.into()))?;
    tab.set_default_timeout(options.timeout);

    let result = drive(&tab, options, query);

    if needs_screenshot(&result)
        && let Some(path) = &options.screenshot_path
    {
        match save_screenshot(&tab, path) {
            Ok(()) => log::info!("Saved failure screenshot to {}", path.display()),
            Err(err) => log::warn!("Could not save failure screenshot: {err}"),
        }
    }

    result
}

/// A run is worth a screenshot when it failed or the results page held no dates.
fn needs_screenshot(result: &Result<Vec<BinCollection>, PortError>) -> bool {
    result.as_ref().map_or(true, Vec::is_empty)
}

fn launch(options: &BrowserOptions) -> Result<Browser, PortError> {
    let user_agent = format!("--user-agent={}", options.user_agent);
    let args = vec![
        OsStr::new("--disable-dev-shm-usage"),
        OsStr::new("--disable-gpu"),
        OsStr::new(user_agent.as_str()),
    ];

    let launch_options = LaunchOptions {
        headless: options.headless,
        sandbox: false,
        window_size: Some(options.window_size),
        path: options.chrome_path.clone(),
        idle_browser_timeout: options.timeout.saturating_mul(2),
        args,
        ..LaunchOptions::default()
    };

    log::debug!("Launching Chrome (headless: {})", options.headless);
    Browser::new(launch_options).map_err(|err| PortError::Browser(err.into()))
}

fn drive(
    tab: &Tab,
    options: &BrowserOptions,
    query: &AddressQuery,
) -> Result<Vec<BinCollection>, PortError> {
    log::info!("Opening {}", options.url);
    tab.navigate_to(&options.url)
        .and_then(|opened| opened.wait_until_navigated())
        .map_err(|err| PortError::form_step("open form", err))?;

    skip_landing_page(tab, options);
    dismiss_cookie_banner(tab);

    log::info!("Entering postcode...");
    enter_postcode(tab, &query.postcode)?;
    sleep(options.address_delay);

    log::info!("Selecting address...");
    select_address(tab, &query.house_number)?;

    log::info!("Reading collection dates...");
    read_results(tab)
}

fn skip_landing_page(tab: &Tab, options: &BrowserOptions) {
    match tab
        .find_element(LANDING_BUTTON)
        .and_then(|button| button.click().map(|_| ()))
    {
        Ok(()) => {
            log::debug!("Left landing page");
            sleep(options.landing_delay);
        }
        Err(err) => log::debug!("No landing page to skip: {err}"),
    }
}

fn dismiss_cookie_banner(tab: &Tab) {
    match tab
        .find_element_by_xpath(COOKIE_ACCEPT_XPATH)
        .and_then(|button| button.click().map(|_| ()))
    {
        Ok(()) => log::debug!("Accepted cookie banner"),
        Err(err) => log::debug!("No cookie banner: {err}"),
    }
}

fn enter_postcode(tab: &Tab, postcode: &str) -> Result<(), PortError> {
    let step = "enter postcode";
    let input = tab
        .wait_for_xpath(POSTCODE_INPUT_XPATH)
        .map_err(|err| PortError::form_step(step, err))?;
    input
        .call_js_fn(CLEAR_INPUT_JS, Vec::new(), false)
        .map_err(|err| PortError::form_step(step, err))?;
    input
        .type_into(postcode)
        .map_err(|err| PortError::form_step(step, err))?;

    tab.find_element_by_xpath(FIND_ADDRESS_XPATH)
        .and_then(|button| button.click().map(|_| ()))
        .map_err(|err| PortError::form_step("find address", err))
}

fn select_address(tab: &Tab, house_number: &str) -> Result<(), PortError> {
    let step = "select address";
    let select = tab
        .wait_for_element(ADDRESS_SELECT)
        .map_err(|err| PortError::form_step(step, err))?;

    let labels = option_labels(&select)?;
    let choice = pick_address(&labels, house_number).ok_or(PortError::AddressNotFound)?;
    if choice.matched {
        log::info!("Matched address '{}'", choice.label);
    } else {
        log::warn!(
            "Could not match house number '{house_number}'. Selecting '{}'.",
            choice.label
        );
    }

    select
        .call_js_fn(SELECT_INDEX_JS, vec![json!(choice.index)], false)
        .map_err(|err| PortError::form_step(step, err))?;

    tab.find_element_by_xpath(NEXT_XPATH)
        .and_then(|button| button.click().map(|_| ()))
        .map_err(|err| PortError::form_step("submit address", err))
}

fn option_labels(select: &Element<'_>) -> Result<Vec<String>, PortError> {
    let step = "read address list";
    let remote = select
        .call_js_fn(READ_OPTIONS_JS, Vec::new(), false)
        .map_err(|err| PortError::form_step(step, err))?;

    let Some(Value::String(encoded)) = remote.value else {
        return Err(PortError::form_step(step, "drop-down returned no option list"));
    };

    serde_json::from_str(&encoded).map_err(|err| PortError::form_step(step, err))
}

fn read_results(tab: &Tab) -> Result<Vec<BinCollection>, PortError> {
    let step = "read collection dates";
    tab.wait_for_element(RESULTS_MARKER)
        .map_err(|err| PortError::form_step(step, err))?;

    let text = tab
        .find_element(RESULTS_CONTAINER)
        .and_then(|form| form.get_inner_text())
        .map_err(|err| PortError::form_step(step, err))?;

    Ok(extract_collections(&text))
}

fn save_screenshot(tab: &Tab, path: &Path) -> Result<(), PortError> {
    let png = tab
        .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
        .map_err(|err| PortError::Browser(err.into()))?;
    fs::write(path, png)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|label| (*label).to_owned()).collect()
    }

    #[test]
    fn leading_house_number_beats_substring() {
        let options = labels(&[
            "Select an address",
            "112 Chorley New Road, Bolton",
            "12 Chorley New Road, Bolton",
        ]);

        let choice = pick_address(&options, "12").expect("an entry is chosen");

        assert_eq!(choice.index, 2, "exact leading number wins");
        assert!(choice.matched, "entry mentions the house number");
    }

    #[test]
    fn substring_match_is_used_when_no_entry_starts_with_number() {
        let options = labels(&["Select an address", "Flat 3, 12 Deane Road, Bolton"]);

        let choice = pick_address(&options, "12").expect("an entry is chosen");

        assert_eq!(choice.index, 1, "substring match");
        assert!(choice.matched, "entry mentions the house number");
    }

    #[test]
    fn house_names_match_case_insensitively_at_start() {
        let options = labels(&["Select an address", "ROSE COTTAGE, Moss Lane"]);

        let choice = pick_address(&options, "Rose").expect("an entry is chosen");

        assert_eq!(choice.index, 1, "leading token compared without case");
    }

    #[test]
    fn falls_back_to_first_real_entry() {
        let options = labels(&["Select an address", "1 Deane Road", "3 Deane Road"]);

        let choice = pick_address(&options, "99").expect("fallback entry");

        assert_eq!(
            choice,
            AddressChoice {
                index: 1,
                label: "1 Deane Road".to_owned(),
                matched: false,
            },
            "first entry after the placeholder"
        );
    }

    #[test]
    fn screenshot_taken_for_errors_and_empty_results() {
        assert!(needs_screenshot(&Err(PortError::AddressNotFound)), "failed run");
        assert!(needs_screenshot(&Ok(Vec::new())), "results page without dates");

        let found = extract_collections("Grey Bin\nTuesday 14 October 2025");
        assert!(!needs_screenshot(&Ok(found)), "successful run");
    }

    #[test]
    fn cookie_button_match_ignores_manage_and_reject_buttons() {
        assert!(COOKIE_ACCEPT_XPATH.contains("'Accept'"), "accept text");
        assert!(
            !COOKIE_ACCEPT_XPATH.contains("@class"),
            "class names like 'cookie-settings' must not match"
        );
        assert!(
            !COOKIE_ACCEPT_XPATH.to_lowercase().contains("cookie"),
            "generic cookie buttons must not match"
        );
    }

    #[test]
    fn placeholder_only_list_has_no_choice() {
        assert_eq!(
            pick_address(&labels(&["Select an address"]), "12"),
            None,
            "nothing to pick"
        );
        assert_eq!(pick_address(&[], "12"), None, "empty list");
    }
}
