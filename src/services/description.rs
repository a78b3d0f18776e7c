//! Human-readable descriptions for maximized windows
//!
//! Preference order: a short main-window title, then the executable's file
//! description, then the bare process name. Anything that cannot be inspected
//! (typically elevated processes) gets the configured fallback.

use crate::config::DescriptionSettings;
use crate::models::WindowHandle;
use crate::platform::{ProcessDetails, ProcessInspector};
use std::sync::Arc;
use tracing::debug;

/// File description reported by the UWP host process; never useful to show
const FRAME_HOST_DESCRIPTION: &str = "Application Frame Host";

#[derive(Clone)]
pub struct DescriptionService {
    inspector: Arc<dyn ProcessInspector>,
    settings: DescriptionSettings,
}

impl DescriptionService {
    pub fn new(inspector: Arc<dyn ProcessInspector>, settings: DescriptionSettings) -> Self {
        Self {
            inspector,
            settings,
        }
    }

    /// Never fails; lookup errors degrade to the fallback text
    pub fn describe(&self, handle: WindowHandle) -> String {
        match self.inspector.process_details(handle) {
            Ok(details) => self.describe_details(&details),
            Err(error) => {
                debug!(%handle, error = %error, "Process lookup failed, using fallback description");
                self.settings.fallback.clone()
            }
        }
    }

    fn describe_details(&self, details: &ProcessDetails) -> String {
        if details.pid == 0 {
            return self.settings.fallback.clone();
        }

        if let Some(title) = details.main_window_title.as_deref() {
            let len = title.encode_utf16().count();
            if len > 0 && len <= self.settings.max_title_len {
                return title.to_string();
            }
        }

        let Some(process_name) = details.process_name() else {
            return self.settings.fallback.clone();
        };

        match details.file_description.as_deref().map(str::trim) {
            Some(description)
                if !description.is_empty() && description != FRAME_HOST_DESCRIPTION =>
            {
                description.to_string()
            }
            _ => process_name,
        }
    }
}
