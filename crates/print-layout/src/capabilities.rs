//! Device capability interface
//!
//! The host printing subsystem answers these queries. Any of them may fail;
//! the engine always substitutes a fallback instead of surfacing the error.

use crate::settings::PrintSettings;
use crate::types::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Printable region of a sheet as reported by the device.
///
/// Coordinates are in points relative to the sheet's top-left corner, for the
/// paper size and orientation the query was made with.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImageableArea {
    pub origin: Point,
    pub extent: Size,
}

impl ImageableArea {
    /// Unprintable strip on each edge: (left, top, right, bottom)
    pub fn insets(&self, sheet: Size) -> (f32, f32, f32, f32) {
        let left = self.origin.x;
        let top = self.origin.y;
        let right = sheet.width - self.origin.x - self.extent.width;
        let bottom = sheet.height - self.origin.y - self.extent.height;
        (left, top, right, bottom)
    }
}

/// Device defaults, as a partial settings record
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PrintTicket {
    pub paper_size: Option<PaperSize>,
    pub orientation: Option<Orientation>,
    pub color_mode: Option<ColorMode>,
    pub quality: Option<PrintQuality>,
    pub duplex: Option<Duplex>,
    pub media_type: Option<String>,
    pub input_source: Option<String>,
}

/// Capability queries answered by a printer driver.
///
/// Enumerations default to "nothing reported", which callers read as
/// "no restriction".
pub trait CapabilityProvider: Send + Sync {
    /// Printable area for the given paper size and orientation
    fn imageable_area(
        &self,
        paper: PaperSize,
        orientation: Orientation,
    ) -> std::result::Result<ImageableArea, CapabilityQueryError>;

    fn color_modes(&self) -> std::result::Result<Vec<ColorMode>, CapabilityQueryError> {
        Ok(Vec::new())
    }

    fn qualities(&self) -> std::result::Result<Vec<PrintQuality>, CapabilityQueryError> {
        Ok(Vec::new())
    }

    fn paper_sizes(&self) -> std::result::Result<Vec<PaperSize>, CapabilityQueryError> {
        Ok(Vec::new())
    }

    fn duplex_modes(&self) -> std::result::Result<Vec<Duplex>, CapabilityQueryError> {
        Ok(Vec::new())
    }

    fn input_bins(&self) -> std::result::Result<Vec<String>, CapabilityQueryError> {
        Ok(Vec::new())
    }

    fn default_ticket(&self) -> std::result::Result<PrintTicket, CapabilityQueryError> {
        Ok(PrintTicket::default())
    }
}

/// Fill `settings` from the device's default ticket.
///
/// A ticket value is taken only when the matching enumeration lists it (or
/// reports nothing). Failed queries leave the current value in place.
pub fn apply_device_defaults(
    settings: &PrintSettings,
    provider: &dyn CapabilityProvider,
) -> PrintSettings {
    let mut populated = settings.clone();

    let ticket = match provider.default_ticket() {
        Ok(ticket) => ticket,
        Err(e) => {
            log::warn!("Keeping current settings, default ticket unavailable: {}", e);
            return populated;
        }
    };

    if let Some(size) = ticket.paper_size {
        if supported(provider.paper_sizes(), &size) {
            populated.paper_size = size;
        }
    }
    if let Some(orientation) = ticket.orientation {
        populated.orientation = orientation;
    }
    if let Some(mode) = ticket.color_mode {
        if supported(provider.color_modes(), &mode) {
            populated.color_mode = mode;
        }
    }
    if let Some(quality) = ticket.quality {
        if supported(provider.qualities(), &quality) {
            populated.quality = quality;
        }
    }
    if let Some(duplex) = ticket.duplex {
        if supported(provider.duplex_modes(), &duplex) {
            populated.duplex = duplex;
        }
    }
    if let Some(bin) = ticket.input_source {
        if supported(provider.input_bins(), &bin) {
            populated.input_source = Some(bin);
        }
    }
    if ticket.media_type.is_some() {
        populated.media_type = ticket.media_type;
    }

    populated
}

fn supported<T: PartialEq>(
    listed: std::result::Result<Vec<T>, CapabilityQueryError>,
    value: &T,
) -> bool {
    match listed {
        Ok(values) => values.is_empty() || values.contains(value),
        Err(e) => {
            log::warn!("Capability enumeration unavailable: {}", e);
            false
        }
    }
}
