pub mod column_value;
pub mod company_field;
pub mod company_record;

pub use column_value::*;
pub use company_field::*;
pub use company_record::*;
