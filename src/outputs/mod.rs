//! Render sinks: where a finished [`PageView`] ends up.
//!
//! # Submodules
//!
//! - [`cards`]: writes article cards to a terminal (or any `io::Write`)
//! - [`json`]: wraps another sink and also snapshots each page to disk
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! ├── all/
//! │   ├── page-1.json
//! │   └── page-2.json
//! └── business/
//!     └── page-1.json
//! ```
//!
//! Sinks are responsible for placeholder substitution; the core hands them
//! articles with missing fields left as `None`.

use crate::models::PageView;

pub mod cards;
pub mod json;

/// Shown when a provider answered successfully with no articles.
pub const NO_RESULTS_MESSAGE: &str = "No news found. Please try a different category.";

/// Receives everything the core wants to show.
pub trait RenderSink {
    /// Loading indicator on/off; always called in pairs around a fetch.
    fn loading(&mut self, active: bool);

    /// Draw a complete page. Snapshot sinks also write it to disk here.
    async fn render(&mut self, view: &PageView);

    /// One-off message (feedback result, stubbed buttons, help text).
    fn notify(&mut self, message: &str);
}

impl<S> RenderSink for &mut S
where
    S: RenderSink,
{
    fn loading(&mut self, active: bool) {
        (**self).loading(active)
    }

    async fn render(&mut self, view: &PageView) {
        (**self).render(view).await
    }

    fn notify(&mut self, message: &str) {
        (**self).notify(message)
    }
}
