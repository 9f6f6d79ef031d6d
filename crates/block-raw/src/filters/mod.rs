//! Node filters

mod blocks;
mod comment;
mod figure;
mod google_docs;
mod head;
mod iframe;
mod image;
mod list;
mod ms_list;
mod phrasing;
mod whitespace;

pub use blocks::{BlockquoteNormaliser, DivNormaliser, TableNormaliser};
pub use comment::CommentRemover;
pub use figure::FigureContentReducer;
pub use google_docs::GoogleDocsFilter;
pub use head::HeadRemover;
pub use iframe::IframeRemover;
pub use image::ImageCorrector;
pub use list::ListReducer;
pub use ms_list::{MsListFilter, MsListIgnoreFilter};
pub use phrasing::PhrasingContentReducer;
pub use whitespace::{BrRemover, EmptyParagraphRemover, HtmlFormattingRemover, SlackParagraphCorrector};

use crate::filter::NodeFilter;

/// Runs on the markup before anything else looks at it.
pub const PRE_FILTERS: &[&dyn NodeFilter] = &[&SlackParagraphCorrector];

/// Rewrites block content before it is checked against the schema.
pub const BLOCK_FILTERS: &[&dyn NodeFilter] = &[
    &GoogleDocsFilter,
    &MsListFilter,
    &HeadRemover,
    &ListReducer,
    &ImageCorrector,
    &PhrasingContentReducer,
    &CommentRemover,
    &IframeRemover,
    &FigureContentReducer,
    &BlockquoteNormaliser,
    &TableNormaliser,
    &DivNormaliser,
];

/// Tidies block content once it has been cleaned and normalised.
pub const CLEANUP_FILTERS: &[&dyn NodeFilter] = &[&HtmlFormattingRemover, &BrRemover, &EmptyParagraphRemover];

/// Rewrites content destined for the inside of an existing block.
pub const INLINE_FILTERS: &[&dyn NodeFilter] = &[
    &HeadRemover,
    &GoogleDocsFilter,
    &MsListIgnoreFilter,
    &PhrasingContentReducer,
    &CommentRemover,
];

/// Tidies inline content once it has been cleaned.
pub const INLINE_CLEANUP_FILTERS: &[&dyn NodeFilter] = &[&HtmlFormattingRemover, &BrRemover];

#[cfg(test)]
pub(crate) mod tests {
    use crate::filter::{FilterContext, NodeFilter, deep_filter_html};
    use block_model::ContentSchema;

    pub(crate) fn run_with(filter: &dyn NodeFilter, html: &str, context: &FilterContext<'_>) -> String {
        deep_filter_html(html, &[filter], context)
    }

    pub(crate) fn run(filter: &dyn NodeFilter, html: &str) -> String {
        let schema = ContentSchema::new();
        let context = FilterContext {
            schema: &schema,
            allow_unfiltered_html: false,
        };
        run_with(filter, html, &context)
    }
}
