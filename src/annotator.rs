//! The producer boundary: "given a document, produce a named view".

use crate::document::Document;
use crate::error::{Error, Result};
use crate::views::ViewVariant;

/// An annotation producer.
///
/// Taggers, chunkers, parsers and resolvers implement this one contract:
/// read the document through its token/text/sentence accessors, build a
/// view against `&Document`, and hand it back. A producer may declare
/// prerequisite view names for a driver to satisfy first.
pub trait Annotator {
    /// The name of the view this annotator produces.
    fn view_name(&self) -> &str;

    /// View names that must exist on a document before [`Self::annotate`]
    /// can run.
    fn required_views(&self) -> &[&str] {
        &[]
    }

    /// Produce the view for `doc`.
    ///
    /// # Errors
    ///
    /// Implementation-defined; a failed producer adds nothing.
    fn annotate(&self, doc: &Document) -> Result<ViewVariant>;
}

impl Document {
    /// Run an annotator and add its view under [`Annotator::view_name`].
    ///
    /// # Errors
    ///
    /// Fails when a required prerequisite view is missing, when the
    /// annotator fails, or when the produced view's name is not the
    /// declared one. A failure adds nothing to the document.
    pub fn annotate(&mut self, annotator: &dyn Annotator) -> Result<()> {
        for required in annotator.required_views() {
            if !self.has_view(required) {
                return Err(Error::ViewNotFound((*required).to_string()));
            }
        }
        let view = annotator.annotate(self)?;
        if view.name() != annotator.view_name() {
            return Err(Error::invalid_input(format!(
                "annotator for '{}' produced view '{}'",
                annotator.view_name(),
                view.name()
            )));
        }
        self.add_view(view);
        Ok(())
    }
}
