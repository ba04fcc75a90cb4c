//! Logical documents and their page content
//!
//! Page content is opaque to the engine and has exactly one owner. It sits in
//! its `Document` until a bound plan takes it, and goes back on release. A
//! preview and a print job that both need content use two documents produced
//! by the same generation hook rather than sharing one.

use crate::types::*;
use std::any::Any;
use std::fmt;

/// Opaque, single-owner page content handle
pub struct PageContent {
    payload: Box<dyn Any + Send + Sync>,
}

impl PageContent {
    pub fn new<T: Any + Send + Sync>(payload: T) -> Self {
        Self {
            payload: Box::new(payload),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref()
    }
}

impl fmt::Debug for PageContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageContent").finish_non_exhaustive()
    }
}

/// One logical page: its intrinsic size plus its content, while the
/// document still owns it
#[derive(Debug)]
pub struct Page {
    size: Size,
    content: Option<PageContent>,
}

impl Page {
    pub fn new(size: Size, content: PageContent) -> Self {
        Self {
            size,
            content: Some(content),
        }
    }

    /// A page with empty content, for documents that only carry geometry
    pub fn blank(size: Size) -> Self {
        Self::new(size, PageContent::new(()))
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn content(&self) -> Option<&PageContent> {
        self.content.as_ref()
    }

    /// True while the content is attached to a placement elsewhere
    pub fn is_attached(&self) -> bool {
        self.content.is_none()
    }
}

/// Ordered sequence of pages, numbered from 1 in range expressions
#[derive(Debug, Default)]
pub struct Document {
    pages: Vec<Page>,
    default_margin: f32,
}

impl Document {
    pub fn new(pages: Vec<Page>, default_margin: f32) -> Self {
        Self {
            pages,
            default_margin,
        }
    }

    /// Build a geometry-only document from page sizes
    pub fn from_sizes(sizes: impl IntoIterator<Item = Size>, default_margin: f32) -> Self {
        Self::new(sizes.into_iter().map(Page::blank).collect(), default_margin)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page at a 0-based index
    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_sizes(&self) -> Vec<Size> {
        self.pages.iter().map(Page::size).collect()
    }

    /// Margin the document was authored with, in points
    pub fn default_margin(&self) -> f32 {
        self.default_margin
    }

    pub fn set_default_margin(&mut self, margin: f32) {
        self.default_margin = margin;
    }

    /// Replace the page list with freshly generated content
    pub fn replace_pages(&mut self, pages: Vec<Page>) {
        self.pages = pages;
    }

    /// Detach the content of the page at a 0-based index.
    ///
    /// Fails with `ContentOwnership` when the content is already attached
    /// somewhere else (or the page does not exist).
    pub fn take_content(&mut self, index: usize) -> Result<PageContent> {
        self.pages
            .get_mut(index)
            .and_then(|page| page.content.take())
            .ok_or(LayoutError::ContentOwnership { page: index + 1 })
    }

    /// Hand detached content back to the page at a 0-based index.
    ///
    /// Content for a page that no longer exists is dropped.
    pub fn restore_content(&mut self, index: usize, content: PageContent) {
        match self.pages.get_mut(index) {
            Some(page) => page.content = Some(content),
            None => log::debug!("Dropping content for removed page {}", index + 1),
        }
    }
}
