use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Expression references a variable the environment does not bind.
    #[snafu(display("unbound variable `{name}` in expression evaluation"))]
    UnboundVariable { name: String },

    #[snafu(display("division by zero"))]
    DivisionByZero,

    /// Expression kind that has no concrete value.
    #[snafu(display("expression is not evaluable: {what}"))]
    NotEvaluable { what: &'static str },
}
