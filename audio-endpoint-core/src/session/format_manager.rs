use crate::models::audio_models::AudioFormat;

/// Bookkeeping for one pipeline's negotiable formats.
///
/// Holds the formats the encoder advertised (order preserved) and the one
/// currently selected. A single advertised format is selected up front.
#[derive(Debug, Clone)]
pub struct FormatManager {
    supported: Vec<AudioFormat>,
    selected: Option<AudioFormat>,
}

impl FormatManager {
    pub fn new(supported: Vec<AudioFormat>) -> Self {
        let selected = match supported.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        };
        Self {
            supported,
            selected,
        }
    }

    pub fn supported_formats(&self) -> &[AudioFormat] {
        &self.supported
    }

    pub fn selected_format(&self) -> Option<&AudioFormat> {
        self.selected.as_ref()
    }

    /// Keep only the supported formats matching `filter`.
    ///
    /// An already-selected format stays selected even if it no longer matches.
    pub fn restrict_formats<F>(&mut self, filter: F)
    where
        F: Fn(&AudioFormat) -> bool,
    {
        self.supported.retain(|f| filter(f));
    }

    /// Select `format` without checking it against the supported set.
    ///
    /// Negotiation happens upstream; a format outside the advertised set is
    /// logged and accepted.
    pub fn set_selected_format(&mut self, format: AudioFormat) {
        if !self.supported.contains(&format) {
            log::warn!("selected format {} is not in the supported set", format);
        }
        self.selected = Some(format);
    }
}
