//! API endpoint implementations.

mod dropdowns;

pub use dropdowns::DropdownsApi;
