// SPDX-License-Identifier: MIT

//! Human-readable names for Usage Pages and Usages.
//!
//! Names come from the HID Usage Tables via the [hut] crate when the
//! `hut` feature is enabled (the default). Without it, no names are
//! available and all lookups return `None`.

use crate::types::{Usage, UsagePage};

/// Short lowercase tokens for the common Usage Pages.
const PAGE_TOKENS: [(u16, &str); 23] = [
    (0x00, "undefined"),
    (0x01, "desktop"),
    (0x02, "simulation"),
    (0x03, "vr"),
    (0x04, "sport"),
    (0x05, "game"),
    (0x06, "device"),
    (0x07, "keyboard"),
    (0x08, "led"),
    (0x09, "button"),
    (0x0A, "ordinal"),
    (0x0B, "telephony"),
    (0x0C, "consumer"),
    (0x0D, "digitizer"),
    (0x0F, "pid"),
    (0x10, "unicode"),
    (0x14, "alphanumeric_display"),
    (0x40, "medical"),
    (0x8C, "pos_bcs"),
    (0x8D, "pos_scale"),
    (0x8E, "pos_msr"),
    (0x90, "camera"),
    (0x91, "arcade"),
];

/// The token of the given Usage Page, if it has one.
pub fn page_token(page: UsagePage) -> Option<&'static str> {
    PAGE_TOKENS
        .iter()
        .find(|(value, _)| *value == page.0)
        .map(|(_, token)| *token)
}

/// The Usage Page a token as returned by [page_token] stands for.
pub fn page_from_token(token: &str) -> Option<UsagePage> {
    let token = token.trim();
    PAGE_TOKENS
        .iter()
        .find(|(_, t)| t.eq_ignore_ascii_case(token))
        .map(|(value, _)| UsagePage(*value))
}

/// The Usage Page with the given name, compared case-insensitively with
/// underscores standing for spaces, e.g. `generic_desktop`.
#[cfg(feature = "hut")]
pub fn page_from_name(name: &str) -> Option<UsagePage> {
    let wanted = name.trim().replace('_', " ");
    (0u16..=0xFF)
        .chain([0xF1D0])
        .map(UsagePage)
        .find(|page| page_name(*page).is_some_and(|n| n.eq_ignore_ascii_case(&wanted)))
}

#[cfg(not(feature = "hut"))]
pub fn page_from_name(_name: &str) -> Option<UsagePage> {
    None
}

/// The name of the given Usage Page, if known.
#[cfg(feature = "hut")]
pub fn page_name(page: UsagePage) -> Option<String> {
    hut::UsagePage::from_usage_page_value(u16::from(page))
        .ok()
        .map(|up| up.name())
}

/// The name of the given Usage on the given page, if known.
#[cfg(feature = "hut")]
pub fn usage_name(page: UsagePage, id: u16) -> Option<String> {
    hut::Usage::new_from_page_and_id(u16::from(page), id)
        .ok()
        .map(|u| u.name())
}

#[cfg(not(feature = "hut"))]
pub fn page_name(_page: UsagePage) -> Option<String> {
    None
}

#[cfg(not(feature = "hut"))]
pub fn usage_name(_page: UsagePage, _id: u16) -> Option<String> {
    None
}

/// The name of `usage`, resolving non-extended usages against `current`.
/// Unknown usages on a known page are named after their page.
pub fn describe(usage: &Usage, current: UsagePage) -> Option<String> {
    let page = usage.page_or(current);
    let id = u16::from(usage.usage_id);
    match usage_name(page, id) {
        Some(name) => Some(name),
        None => page_name(page).map(|p| format!("{p} {id:#06x}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_tokens() {
        assert_eq!(page_token(UsagePage(0x0d)), Some("digitizer"));
        assert_eq!(page_token(UsagePage(0xff00)), None);
        assert_eq!(page_from_token("Desktop"), Some(UsagePage(0x01)));
        assert_eq!(page_from_token("pos_msr"), Some(UsagePage(0x8e)));
        assert_eq!(page_from_token("gadgets"), None);
        for (value, token) in PAGE_TOKENS {
            assert_eq!(page_from_token(token), Some(UsagePage(value)));
        }
    }

    #[cfg(feature = "hut")]
    #[test]
    fn page_names() {
        assert_eq!(page_from_name("Generic Desktop"), Some(UsagePage(0x01)));
        assert_eq!(page_from_name("generic_desktop"), Some(UsagePage(0x01)));
        assert_eq!(page_from_name("Digitizers"), Some(UsagePage(0x0d)));
        assert_eq!(page_from_name("Nonsense Page"), None);
    }

    #[cfg(feature = "hut")]
    #[test]
    fn names() {
        assert_eq!(page_name(UsagePage(0x01)).as_deref(), Some("Generic Desktop"));
        assert_eq!(usage_name(UsagePage(0x01), 0x02).as_deref(), Some("Mouse"));
    }

    #[cfg(feature = "hut")]
    #[test]
    fn describe_resolves_page() {
        let usage = Usage::from_id(0x30);
        assert_eq!(describe(&usage, UsagePage(0x01)).as_deref(), Some("X"));
        let usage = Usage::extended(0x01, 0x31);
        assert_eq!(describe(&usage, UsagePage(0x0d)).as_deref(), Some("Y"));
    }
}
