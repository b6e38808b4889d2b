pub mod interpolation;
pub mod vector2d;
