pub mod curve;
pub mod matching;

pub use curve::{
    geometry_name, Arc, BSpline, Circle, Curve, CurveKind, Ellipse, EvalResult, Line, PointPos,
};
