pub mod archive;
pub mod cells;
pub mod combine;
pub mod config;
pub mod document;
pub mod edit;
pub mod flatten;
pub mod inventory;
pub mod normalize;
pub mod notify;
pub mod output;
pub mod paths;
pub mod rename;
pub mod scan;
pub mod schema;
pub mod select;
pub mod warn;
