/// JSON-to-table formatting: column naming, table/record building, response transforms.
pub mod column;
pub mod table;
pub mod transform;

pub use column::ColumnSpec;
pub use table::{RecordResult, TableResult, cell_text, to_record, to_table};
pub use transform::Marker;
