mod predicate;
mod state;

pub use predicate::{
    compare, display_order, filter_and_sort, matches, text_matches, PACKS_TYPE, PRICE_SLIDER_MAX,
};
pub use state::{deserialize_filters, serialize_filters, FilterGroup, FilterState, FilterValue};
