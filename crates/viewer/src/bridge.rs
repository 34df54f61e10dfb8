use std::rc::Rc;

use scene::selection::SelectedFeature;
use scene::visibility::FilterCriteria;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

pub type CriteriaListener = Rc<dyn Fn(&FilterCriteria)>;

/// Adapter between the viewer core and the application state store.
///
/// Reads flow in (search text and filters, combined into one
/// [`FilterCriteria`]); the only write is the current selection.
/// Implementations use interior mutability and must invoke listeners
/// without holding their own borrows.
pub trait StateBridge {
    fn filter_criteria(&self) -> FilterCriteria;
    fn publish_selection(&self, selection: Option<SelectedFeature>);
    fn subscribe_criteria(&self, listener: CriteriaListener) -> SubscriptionId;
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}
