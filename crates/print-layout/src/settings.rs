use crate::constants::MARGIN_EPSILON;
use crate::types::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which logical pages go to the printer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PageSelection {
    #[default]
    All,
    /// Only the page the user is looking at (`PrintSettings::current_page`)
    Current,
    /// Pages named by `PrintSettings::custom_range`
    Custom,
}

/// How content is scaled into its cell
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ScalePolicy {
    /// Largest uniform scale at which the content still fits its cell
    #[default]
    AutoFit,
    /// One of the preset percentages offered by the host (e.g. 50, 100, 200)
    FixedPercent(u32),
    /// Free-form percentage typed by the user
    Custom(f32),
}

/// Where the margin around the printable area comes from
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MarginPolicy {
    /// The document's own margin
    #[default]
    DocumentDefault,
    /// Print edge to edge
    None,
    /// The smallest margin the device can print, as reported by its driver
    DeviceMinimum,
    /// User supplied margin in points
    Custom(f32),
}

/// Snapshot of every user-facing print setting
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PrintSettings {
    // Job
    pub copies: u32,
    pub collation: Collation,

    // Page selection
    pub page_selection: PageSelection,
    pub custom_range: String,
    pub current_page: usize,

    // Paper
    pub orientation: Orientation,
    pub paper_size: PaperSize,
    pub color_mode: ColorMode,
    pub quality: PrintQuality,

    // Imposition
    pub pages_per_sheet: PagesPerSheet,
    pub page_order: PageOrder,
    pub scale: ScalePolicy,
    pub margin: MarginPolicy,

    // Device
    pub duplex: Duplex,
    pub media_type: Option<String>,
    pub input_source: Option<String>,
}

impl Default for PrintSettings {
    fn default() -> Self {
        Self {
            copies: 1,
            collation: Collation::Collated,
            page_selection: PageSelection::All,
            custom_range: String::new(),
            current_page: 1,
            orientation: Orientation::Portrait,
            paper_size: PaperSize::Letter,
            color_mode: ColorMode::Color,
            quality: PrintQuality::Normal,
            pages_per_sheet: PagesPerSheet::One,
            page_order: PageOrder::Horizontal,
            scale: ScalePolicy::AutoFit,
            margin: MarginPolicy::DocumentDefault,
            duplex: Duplex::OneSided,
            media_type: None,
            input_source: None,
        }
    }
}

/// A single settings mutation.
///
/// Every change the host makes is expressed as one of these records and fed
/// to the reconciliation loop, which applies it and rebuilds the sheet plan.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsChange {
    Copies(u32),
    Collation(Collation),
    PageSelection(PageSelection),
    CustomRange(String),
    CurrentPage(usize),
    Orientation(Orientation),
    PaperSize(PaperSize),
    ColorMode(ColorMode),
    Quality(PrintQuality),
    PagesPerSheet(PagesPerSheet),
    PageOrder(PageOrder),
    Scale(ScalePolicy),
    Margin(MarginPolicy),
    Duplex(Duplex),
    MediaType(Option<String>),
    InputSource(Option<String>),
}

impl SettingsChange {
    /// Whether the change alters sheet or cell geometry, in which case the
    /// document-generation hook is given a chance to regenerate content.
    pub fn affects_geometry(&self) -> bool {
        matches!(
            self,
            SettingsChange::Orientation(_)
                | SettingsChange::PaperSize(_)
                | SettingsChange::PagesPerSheet(_)
                | SettingsChange::Scale(_)
                | SettingsChange::Margin(_)
        )
    }
}

impl PrintSettings {
    /// Load settings from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let settings = serde_json::from_slice(&bytes)
            .map_err(|e| LayoutError::Config(format!("Failed to parse settings: {}", e)))?;
        Ok(settings)
    }

    /// Save settings to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| LayoutError::Config(format!("Failed to serialize settings: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Apply one change record to this snapshot
    pub fn apply(&mut self, change: SettingsChange) {
        match change {
            SettingsChange::Copies(copies) => self.copies = copies,
            SettingsChange::Collation(collation) => self.collation = collation,
            SettingsChange::PageSelection(selection) => self.page_selection = selection,
            SettingsChange::CustomRange(expression) => self.custom_range = expression,
            SettingsChange::CurrentPage(page) => self.current_page = page,
            SettingsChange::Orientation(orientation) => self.orientation = orientation,
            SettingsChange::PaperSize(size) => self.paper_size = size,
            SettingsChange::ColorMode(mode) => self.color_mode = mode,
            SettingsChange::Quality(quality) => self.quality = quality,
            SettingsChange::PagesPerSheet(pps) => self.pages_per_sheet = pps,
            SettingsChange::PageOrder(order) => self.page_order = order,
            SettingsChange::Scale(scale) => self.scale = scale,
            SettingsChange::Margin(margin) => self.margin = margin,
            SettingsChange::Duplex(duplex) => self.duplex = duplex,
            SettingsChange::MediaType(media) => self.media_type = media,
            SettingsChange::InputSource(source) => self.input_source = source,
        }
    }

    /// Sheet size in points, orientation applied
    pub fn sheet_size(&self) -> Size {
        self.paper_size.size_with_orientation(self.orientation)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.copies == 0 {
            return Err(LayoutError::Config(
                "At least one copy must be printed".to_string(),
            ));
        }

        if self.current_page == 0 {
            return Err(LayoutError::Config(
                "Current page numbers start at 1".to_string(),
            ));
        }

        if let PaperSize::Custom {
            width_mm,
            height_mm,
        } = self.paper_size
        {
            if !(width_mm.is_finite() && height_mm.is_finite()) || width_mm <= 0.0 || height_mm <= 0.0
            {
                return Err(LayoutError::Config(format!(
                    "Custom paper size must be positive, got {}x{} mm",
                    width_mm, height_mm
                )));
            }
        }

        match self.scale {
            ScalePolicy::FixedPercent(0) => {
                return Err(LayoutError::Config(
                    "Fixed scale must be greater than 0%".to_string(),
                ));
            }
            ScalePolicy::Custom(percent) if !percent.is_finite() || percent <= 0.0 => {
                return Err(LayoutError::Config(format!(
                    "Custom scale must be a positive percentage, got {}",
                    percent
                )));
            }
            _ => {}
        }

        if let MarginPolicy::Custom(margin) = self.margin {
            if !margin.is_finite() || margin < 0.0 {
                return Err(LayoutError::Config(format!(
                    "Custom margin must be zero or more, got {}",
                    margin
                )));
            }
        }

        Ok(())
    }
}

/// Largest custom margin that still leaves a printable area on `sheet`.
pub fn max_custom_margin(sheet: Size) -> f32 {
    (sheet.width.min(sheet.height) / 2.0 - MARGIN_EPSILON).max(0.0)
}

/// Clamp a user-entered margin into `[0, max_custom_margin(sheet)]`.
///
/// The margin resolver takes custom values as given; input surfaces call this
/// before issuing a `SettingsChange::Margin`.
pub fn clamp_custom_margin(value: f32, sheet: Size) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, max_custom_margin(sheet))
}
