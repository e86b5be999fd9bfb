//! Font support: the four standard Type1 fonts are handled directly by the
//! writer; this module covers embedded TrueType fonts.

mod truetype;

pub use truetype::{FontMetricsReader, TrueTypeError, TrueTypeResult};
