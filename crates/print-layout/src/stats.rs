use crate::layout::SheetPlan;
use crate::settings::PrintSettings;
use crate::submit::sheet_consumption;
use crate::types::*;

/// Calculate statistics for a laid-out job
pub fn calculate_statistics(plan: &SheetPlan, settings: &PrintSettings) -> JobStatistics {
    let selected_pages = plan.placement_count();
    let sheets = plan.sheet_count();
    let two_sided = settings.duplex.is_two_sided();

    // Unused cells only ever appear on the last sheet
    let empty_cells = plan
        .sheets
        .last()
        .map(|sheet| plan.grid.cell_count().saturating_sub(sheet.placements.len()))
        .unwrap_or(0);

    JobStatistics {
        selected_pages,
        sheets,
        sides: sheets,
        physical_sheets_per_copy: sheet_consumption(sheets, 1, two_sided),
        physical_sheets: sheet_consumption(sheets, settings.copies as usize, two_sided),
        empty_cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::plan::layout_document;

    #[test]
    fn test_duplex_halves_paper() {
        let doc = Document::from_sizes(vec![Size::new(612.0, 792.0); 5], 0.0);
        let mut settings = PrintSettings::default();
        settings.pages_per_sheet = PagesPerSheet::Four;
        settings.copies = 3;
        settings.duplex = Duplex::LongEdge;

        let plan = layout_document(&settings, &doc, None).unwrap();
        let stats = calculate_statistics(&plan, &settings);

        assert_eq!(stats.selected_pages, 5);
        assert_eq!(stats.sheets, 2);
        assert_eq!(stats.sides, 2);
        assert_eq!(stats.physical_sheets_per_copy, 1);
        assert_eq!(stats.physical_sheets, 3);
        assert_eq!(stats.empty_cells, 3);
    }

    #[test]
    fn test_empty_plan() {
        let doc = Document::from_sizes(Vec::new(), 0.0);
        let settings = PrintSettings::default();
        let plan = layout_document(&settings, &doc, None).unwrap();
        let stats = calculate_statistics(&plan, &settings);

        assert_eq!(stats.sheets, 0);
        assert_eq!(stats.physical_sheets, 0);
        assert_eq!(stats.empty_cells, 0);
    }
}
