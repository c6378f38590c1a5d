//! Link builder turning a platform selection into the payload to encode

use crate::platform::{self, CUSTOM_LINK};

/// Build the payload string for a platform selection.
///
/// `Custom Link` yields `custom_link` verbatim; any other registry platform
/// yields its profile URL for `username`. Unknown platforms yield `None`, so
/// no QR code is generated for them.
pub fn build(platform_name: &str, username: &str, custom_link: &str) -> Option<String> {
    if platform_name == CUSTOM_LINK {
        return Some(custom_link.to_string());
    }

    let entry = platform::lookup(platform_name)?;
    Some(entry.profile_url(username))
}
