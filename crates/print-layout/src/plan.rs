//! Sheet plan construction and content binding

use crate::capabilities::CapabilityProvider;
use crate::document::{Document, PageContent};
use crate::layout::*;
use crate::margin::resolve_margin;
use crate::range::resolve_selection;
use crate::scale::resolve_scale;
use crate::settings::{PrintSettings, ScalePolicy};
use crate::types::*;

/// Everything needed to compose the sheets of one plan, one at a time.
///
/// The reconciler composes and publishes sheets incrementally from a builder;
/// `build` composes them all at once.
#[derive(Debug, Clone)]
pub struct PlanBuilder {
    grid: GridLayout,
    sheet_size: Size,
    margin: f32,
    policy: ScalePolicy,
    scale: ResolvedScale,
    page_sizes: Vec<Size>,
    assignments: Vec<SheetAssignment>,
}

impl PlanBuilder {
    /// # Arguments
    /// * `settings` - Settings snapshot
    /// * `page_sizes` - Intrinsic size of every document page
    /// * `selected` - 1-based page numbers, ascending; numbers outside the
    ///   document are ignored
    /// * `margin` - Resolved margin in points
    pub fn new(
        settings: &PrintSettings,
        page_sizes: Vec<Size>,
        selected: &[usize],
        margin: f32,
    ) -> Self {
        let sheet_size = settings.sheet_size();
        let grid = create_grid_layout(
            settings.pages_per_sheet,
            settings.orientation,
            sheet_size,
            margin,
        );

        let indices: Vec<usize> = selected
            .iter()
            .filter(|&&page| page >= 1 && page <= page_sizes.len())
            .map(|&page| page - 1)
            .collect();

        let assignments = plan_sheets(
            &indices,
            settings.pages_per_sheet,
            settings.page_order,
            settings.orientation,
        );

        let scale = resolve_plan_scale(
            settings,
            &grid,
            printable_area(sheet_size, margin).size(),
            &page_sizes,
            &indices,
        );

        Self {
            grid,
            sheet_size,
            margin,
            policy: settings.scale,
            scale,
            page_sizes,
            assignments,
        }
    }

    pub fn sheet_count(&self) -> usize {
        self.assignments.len()
    }

    pub fn margin(&self) -> f32 {
        self.margin
    }

    pub fn scale(&self) -> ResolvedScale {
        self.scale
    }

    /// Compose the sheet at `index`
    pub fn compose(&self, index: usize) -> Option<Sheet> {
        let params = CompositionParams {
            grid: &self.grid,
            sheet_size: self.sheet_size,
            margin: self.margin,
            policy: self.policy,
            scale: self.scale,
            page_sizes: &self.page_sizes,
        };
        self.assignments
            .get(index)
            .map(|assignment| compose_sheet(assignment, &params))
    }

    /// A plan carrying this builder's geometry and no sheets yet
    pub fn empty_plan(&self) -> SheetPlan {
        SheetPlan {
            sheets: Vec::new(),
            sheet_size: self.sheet_size,
            grid: self.grid,
            margin: self.margin,
            scale: self.scale,
        }
    }

    /// Compose every sheet
    pub fn build(&self) -> SheetPlan {
        let mut plan = self.empty_plan();
        plan.sheets = (0..self.sheet_count())
            .filter_map(|index| self.compose(index))
            .collect();
        plan
    }
}

/// Single-page sheets share one factor resolved against the bounding box of
/// all selected content, so every sheet of the job uses the same number.
/// Imposed sheets auto-fit each page to its own cell.
fn resolve_plan_scale(
    settings: &PrintSettings,
    grid: &GridLayout,
    printable: Size,
    page_sizes: &[Size],
    indices: &[usize],
) -> ResolvedScale {
    let bounding = indices
        .iter()
        .filter_map(|&index| page_sizes.get(index))
        .fold(Size::ZERO, |acc, size| {
            Size::new(acc.width.max(size.width), acc.height.max(size.height))
        });

    match settings.scale {
        ScalePolicy::AutoFit if grid.cell_count() == 1 => {
            ResolvedScale::Uniform(resolve_scale(ScalePolicy::AutoFit, bounding, printable))
        }
        ScalePolicy::AutoFit => ResolvedScale::PerCell,
        policy => ResolvedScale::Uniform(resolve_scale(policy, bounding, grid.cell_size())),
    }
}

/// Lay out a whole document synchronously.
///
/// Resolves the page selection and margin from `settings` and builds every
/// sheet. A custom range that does not parse is returned as an error.
pub fn layout_document(
    settings: &PrintSettings,
    document: &Document,
    capabilities: Option<&dyn CapabilityProvider>,
) -> Result<SheetPlan> {
    let selected = resolve_selection(settings, document.page_count())?;
    let margin = resolve_margin(
        settings.margin,
        document.default_margin(),
        settings.paper_size,
        settings.orientation,
        capabilities,
    );
    Ok(PlanBuilder::new(settings, document.page_sizes(), &selected, margin).build())
}

/// A sheet plan holding the content of every placed page.
///
/// `contents[s][p]` belongs to `plan.sheets[s].placements[p]`.
#[derive(Debug)]
pub struct BoundSheetPlan {
    plan: SheetPlan,
    contents: Vec<Vec<PageContent>>,
}

impl BoundSheetPlan {
    pub fn plan(&self) -> &SheetPlan {
        &self.plan
    }

    /// Placements of a sheet paired with their content
    pub fn sheet(&self, index: usize) -> Option<impl Iterator<Item = (&Placement, &PageContent)>> {
        let sheet = self.plan.sheets.get(index)?;
        let contents = self.contents.get(index)?;
        Some(sheet.placements.iter().zip(contents.iter()))
    }

    /// Give every content handle back to its page in `document`
    pub fn release(self, document: &mut Document) {
        for (sheet, contents) in self.plan.sheets.iter().zip(self.contents) {
            for (placement, content) in sheet.placements.iter().zip(contents) {
                document.restore_content(placement.page_index, content);
            }
        }
    }
}

impl SheetPlan {
    /// Move the content of every placed page out of `document`.
    ///
    /// Fails with `ContentOwnership` if any page's content is already attached
    /// elsewhere; in that case everything taken so far is handed back.
    pub fn bind(&self, document: &mut Document) -> Result<BoundSheetPlan> {
        let mut contents: Vec<Vec<PageContent>> = Vec::with_capacity(self.sheets.len());

        for sheet in &self.sheets {
            let mut sheet_contents = Vec::with_capacity(sheet.placements.len());
            for placement in &sheet.placements {
                match document.take_content(placement.page_index) {
                    Ok(content) => sheet_contents.push(content),
                    Err(e) => {
                        contents.push(sheet_contents);
                        restore_partial(&self.sheets, contents, document);
                        return Err(e);
                    }
                }
            }
            contents.push(sheet_contents);
        }

        Ok(BoundSheetPlan {
            plan: self.clone(),
            contents,
        })
    }
}

fn restore_partial(sheets: &[Sheet], contents: Vec<Vec<PageContent>>, document: &mut Document) {
    for (sheet, taken) in sheets.iter().zip(contents) {
        for (placement, content) in sheet.placements.iter().zip(taken) {
            document.restore_content(placement.page_index, content);
        }
    }
}
