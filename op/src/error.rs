use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures of the operation wrapper.
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("iteration variable `{iter_var}` already has a bound installed"))]
    DuplicateBinding { iter_var: String },

    #[snafu(display("`{op}` declares {declared} outputs but {bound} canonical tensors were supplied"))]
    OutputArityMismatch { op: String, declared: usize, bound: usize },

    #[snafu(transparent)]
    Schedule { source: tessel_schedule::Error },
}
