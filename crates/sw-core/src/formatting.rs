//! User-facing texts, in English.

use crate::model::Site;

pub const WELCOME: &str = "Welcome! Choose an action:";
pub const ENTER_URL: &str = "Please enter the site address:";
pub const ALREADY_ADDED: &str = "This site has already been added.";
pub const INVALID_URL: &str = "That does not look like a web address. Use a full http:// or https:// URL.";
pub const NO_SITES: &str = "You have no sites yet.";
pub const CHOOSE_SITE: &str = "Choose a site:";
pub const CONFIRM_CLEAR_ALL: &str = "Are you sure you want to erase all data?";
pub const ALL_CLEARED: &str = "All data cleared.";
pub const ADD_FAILED: &str = "An error occurred while adding the site.";
pub const REFRESH_FAILED: &str = "An error occurred while updating the site data.";
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

pub fn site_removed(url: &str) -> String {
    format!("Site {url} removed.")
}

pub fn site_added(site: &Site) -> String {
    format!(
        "Site {} added!\nTitle: {}\nStatus: {}\nCertificate expiry: {}",
        site.url, site.title, site.status, site.cert_expiry
    )
}

pub fn site_info(site: &Site) -> String {
    format!(
        "URL: {}\nTitle: {}\nStatus: {}\nCertificate expiry: {}",
        site.url, site.title, site.status, site.cert_expiry
    )
}
