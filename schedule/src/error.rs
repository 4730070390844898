use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures of the rewriting passes.
///
/// Every variant is a non-recoverable precondition violation: either the
/// caller handed over a malformed schedule or domain map, or an internal
/// invariant broke. No partial tree is ever returned. The two families are
/// told apart with [`Error::is_invariant_violation`].
#[derive(Debug, Clone, PartialEq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("malformed schedule: split parent `{parent}` does not bind any loop in the tree"))]
    SplitTargetNotFound { parent: String },

    #[snafu(display(
        "malformed schedule: fuse pair `{outer}`/`{inner}` was not found as a properly nested loop pair"
    ))]
    FuseTargetNotFound { outer: String, inner: String },

    #[snafu(display("malformed schedule: no domain for iteration variable `{iter_var}`"))]
    MissingDomain { iter_var: String },

    #[snafu(display("malformed schedule: domain of `{iter_var}` must start at zero"))]
    NonZeroDomainMin { iter_var: String },

    #[snafu(display("malformed schedule: rebase parent of `{rebased}` has no defined domain"))]
    RebaseParentUndefined { rebased: String },

    #[snafu(display(
        "malformed schedule: cannot reorder; the tree has {current} loops but the stage requires {required}"
    ))]
    LeafOrderMismatch { current: usize, required: usize },

    #[snafu(display(
        "malformed schedule: pragma keys/values of `{iter_var}` differ in length ({keys} keys, {values} values)"
    ))]
    PragmaArityMismatch { iter_var: String, keys: usize, values: usize },

    #[snafu(display("malformed schedule: thread axis `{axis}` extent differs from the loop extent it binds"))]
    ThreadExtentMismatch { axis: String },

    #[snafu(display("invariant violation: iteration variable `{iter_var}` binds {found} loops; exactly one required"))]
    LoopMultiplicity { iter_var: String, found: usize },

    #[snafu(display("invariant violation: loop reorder fixpoint made no progress"))]
    NoReorderProgress,
}

impl Error {
    /// Internal-invariant failures, as opposed to malformed caller input.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Error::LoopMultiplicity { .. } | Error::NoReorderProgress)
    }
}
