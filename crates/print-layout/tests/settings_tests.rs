use print_layout::*;
use print_layout::constants::mm_to_pt;

#[test]
fn test_validation_zero_copies() {
    let mut settings = PrintSettings::default();
    settings.copies = 0;
    match settings.validate() {
        Err(LayoutError::Config(msg)) => assert!(msg.contains("copy")),
        _ => panic!("Expected Config error"),
    }
}

#[test]
fn test_validation_scale_and_margin() {
    let mut settings = PrintSettings::default();
    assert!(settings.validate().is_ok());

    settings.scale = ScalePolicy::FixedPercent(0);
    assert!(settings.validate().is_err());

    settings.scale = ScalePolicy::Custom(-20.0);
    assert!(settings.validate().is_err());

    settings.scale = ScalePolicy::Custom(f32::INFINITY);
    assert!(settings.validate().is_err());

    settings.scale = ScalePolicy::Custom(150.0);
    assert!(settings.validate().is_ok());

    settings.margin = MarginPolicy::Custom(-1.0);
    assert!(settings.validate().is_err());

    settings.margin = MarginPolicy::Custom(0.0);
    assert!(settings.validate().is_ok());
}

#[test]
fn test_validation_custom_paper() {
    let mut settings = PrintSettings::default();
    settings.paper_size = PaperSize::Custom {
        width_mm: 0.0,
        height_mm: 100.0,
    };
    assert!(settings.validate().is_err());

    settings.paper_size = PaperSize::Custom {
        width_mm: 100.0,
        height_mm: 150.0,
    };
    assert!(settings.validate().is_ok());
}

#[test]
fn test_apply_changes() {
    let mut settings = PrintSettings::default();
    settings.apply(SettingsChange::PaperSize(PaperSize::A4));
    settings.apply(SettingsChange::Orientation(Orientation::Landscape));
    settings.apply(SettingsChange::PagesPerSheet(PagesPerSheet::Six));

    assert_eq!(settings.paper_size, PaperSize::A4);
    let sheet = settings.sheet_size();
    assert!(sheet.width > sheet.height);
    assert!((sheet.width - mm_to_pt(297.0)).abs() < 0.001);
    assert_eq!(settings.pages_per_sheet.count(), 6);
}

#[test]
fn test_geometry_changes() {
    assert!(SettingsChange::Margin(MarginPolicy::None).affects_geometry());
    assert!(SettingsChange::Scale(ScalePolicy::FixedPercent(50)).affects_geometry());
    assert!(SettingsChange::Orientation(Orientation::Landscape).affects_geometry());
    assert!(!SettingsChange::Copies(3).affects_geometry());
    assert!(!SettingsChange::PageOrder(PageOrder::Vertical).affects_geometry());
    assert!(!SettingsChange::CustomRange("1-2".to_string()).affects_geometry());
}

#[test]
fn test_custom_margin_clamp() {
    let sheet = Size::new(200.0, 100.0);
    assert!((max_custom_margin(sheet) - 49.99).abs() < 0.001);
    assert!((clamp_custom_margin(80.0, sheet) - 49.99).abs() < 0.001);
    assert_eq!(clamp_custom_margin(-5.0, sheet), 0.0);
    assert_eq!(clamp_custom_margin(f32::NAN, sheet), 0.0);
    assert_eq!(clamp_custom_margin(12.0, sheet), 12.0);
}

#[cfg(feature = "serde")]
#[tokio::test]
async fn test_save_and_load_settings() {
    use tempfile::NamedTempFile;

    let mut settings = PrintSettings::default();
    settings.copies = 4;
    settings.page_selection = PageSelection::Custom;
    settings.custom_range = "1-3, 8".to_string();
    settings.paper_size = PaperSize::Custom {
        width_mm: 120.0,
        height_mm: 180.0,
    };
    settings.pages_per_sheet = PagesPerSheet::Nine;
    settings.page_order = PageOrder::VerticalReverse;
    settings.scale = ScalePolicy::Custom(85.0);
    settings.margin = MarginPolicy::DeviceMinimum;
    settings.duplex = Duplex::ShortEdge;
    settings.input_source = Some("Tray 2".to_string());

    let temp_file = NamedTempFile::new().unwrap();
    let path = temp_file.path();

    settings.save(path).await.unwrap();
    let loaded = PrintSettings::load(path).await.unwrap();

    assert_eq!(loaded, settings);
}

#[cfg(feature = "serde")]
#[tokio::test]
async fn test_load_invalid_settings() {
    use tempfile::NamedTempFile;

    let temp_file = NamedTempFile::new().unwrap();
    tokio::fs::write(temp_file.path(), b"{ not json").await.unwrap();

    match PrintSettings::load(temp_file.path()).await {
        Err(LayoutError::Config(msg)) => assert!(msg.contains("parse")),
        other => panic!("Expected Config error, got {:?}", other),
    }
}
