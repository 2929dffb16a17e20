pub mod calendar;
pub mod export_button;
pub mod family_tree;
