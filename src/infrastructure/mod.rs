pub mod xform_converter;

pub use xform_converter::{FormConverter, Xls2XformConverter};
